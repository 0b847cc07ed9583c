//! Test fixtures: the `validator.proto` schema in decoded form and as
//! serialized descriptors, plus the source it must generate.
//!
//! `prost-types` drops unknown option extensions on encode, so the user file
//! is built from local mirrors of the descriptor messages that carry the
//! `protonorm.rules` extension as a regular field.

use crate::constraint::{MapRules, StringRules};
use crate::schema::{FieldSchema, FieldShape, FileSchema, MessageSchema};

pub(crate) const GOLDEN_VALIDATOR: &str =
    include_str!("../tests/fixtures/validator.validate.rs");

fn field(name: &str, shape: FieldShape, constraint: Option<crate::Constraint>) -> FieldSchema {
    FieldSchema {
        name: name.to_string(),
        rust_ident: name.to_string(),
        shape,
        constraint,
    }
}

fn message(full_name: &str, rust_path: &str, fields: Vec<FieldSchema>) -> MessageSchema {
    MessageSchema {
        full_name: full_name.to_string(),
        rust_path: rust_path.to_string(),
        fields,
    }
}

const STRING: FieldShape = FieldShape::ScalarString {
    explicit_presence: false,
};

/// `validator.proto` as the extractor sees it
pub(crate) fn validator_schema() -> FileSchema {
    let name_rules = StringRules::new().min_len(3).max_len(10).reject_whitespace(true);

    FileSchema {
        name: "validator.proto".to_string(),
        package: "validator".to_string(),
        messages: vec![
            message(
                "validator.Name",
                "Name",
                vec![field("name", STRING, Some(name_rules.into()))],
            ),
            message(
                "validator.Tags",
                "Tags",
                vec![field("tags", FieldShape::StringMap, Some(MapRules::new().into()))],
            ),
            message("validator.Plain", "Plain", vec![field("note", STRING, None)]),
            message(
                "validator.Account",
                "Account",
                vec![
                    field("handle", STRING, Some(name_rules.into())),
                    field(
                        "nickname",
                        FieldShape::ScalarString {
                            explicit_presence: true,
                        },
                        Some(StringRules::new().max_len(8).into()),
                    ),
                    field("labels", FieldShape::StringMap, Some(MapRules::new().into())),
                    field("age", FieldShape::Unsupported("int32".to_string()), None),
                ],
            ),
        ],
    }
}

#[cfg(feature = "codegen")]
pub(crate) use descriptors::*;

#[cfg(feature = "codegen")]
mod descriptors {
    use heck::ToUpperCamelCase;
    use prost::Message;
    use prost_types::compiler::CodeGeneratorRequest;
    use prost_types::descriptor_proto::ExtensionRange;
    use prost_types::field_descriptor_proto::{Label, Type};
    use prost_types::{
        DescriptorProto, FieldDescriptorProto, FileDescriptorProto, FileDescriptorSet,
        OneofDescriptorProto,
    };

    #[derive(Clone, PartialEq, Message)]
    pub(crate) struct FileProto {
        #[prost(string, optional, tag = "1")]
        pub(crate) name: Option<String>,
        #[prost(string, optional, tag = "2")]
        pub(crate) package: Option<String>,
        #[prost(string, repeated, tag = "3")]
        pub(crate) dependency: Vec<String>,
        #[prost(message, repeated, tag = "4")]
        pub(crate) message_type: Vec<MessageProto>,
        #[prost(string, optional, tag = "12")]
        pub(crate) syntax: Option<String>,
    }

    #[derive(Clone, PartialEq, Message)]
    pub(crate) struct MessageProto {
        #[prost(string, optional, tag = "1")]
        pub(crate) name: Option<String>,
        #[prost(message, repeated, tag = "2")]
        pub(crate) field: Vec<FieldProto>,
        #[prost(message, repeated, tag = "3")]
        pub(crate) nested_type: Vec<MessageProto>,
        #[prost(message, optional, tag = "7")]
        pub(crate) options: Option<MessageOptionsProto>,
        #[prost(message, repeated, tag = "8")]
        pub(crate) oneof_decl: Vec<OneofDescriptorProto>,
    }

    #[derive(Clone, PartialEq, Message)]
    pub(crate) struct MessageOptionsProto {
        #[prost(bool, optional, tag = "7")]
        pub(crate) map_entry: Option<bool>,
    }

    #[derive(Clone, PartialEq, Message)]
    pub(crate) struct FieldProto {
        #[prost(string, optional, tag = "1")]
        pub(crate) name: Option<String>,
        #[prost(int32, optional, tag = "3")]
        pub(crate) number: Option<i32>,
        #[prost(int32, optional, tag = "4")]
        pub(crate) label: Option<i32>,
        #[prost(int32, optional, tag = "5")]
        pub(crate) kind: Option<i32>,
        #[prost(string, optional, tag = "6")]
        pub(crate) type_name: Option<String>,
        #[prost(message, optional, tag = "8")]
        pub(crate) options: Option<FieldOptionsProto>,
        #[prost(int32, optional, tag = "9")]
        pub(crate) oneof_index: Option<i32>,
        #[prost(bool, optional, tag = "17")]
        pub(crate) proto3_optional: Option<bool>,
    }

    #[derive(Clone, PartialEq, Message)]
    pub(crate) struct FieldOptionsProto {
        #[prost(message, optional, tag = "51971")]
        pub(crate) rules: Option<FieldRulesProto>,
    }

    #[derive(Clone, PartialEq, Message)]
    pub(crate) struct FieldRulesProto {
        #[prost(oneof = "RuleKind", tags = "1, 2")]
        pub(crate) kind: Option<RuleKind>,
    }

    #[derive(Clone, PartialEq, prost::Oneof)]
    pub(crate) enum RuleKind {
        #[prost(message, tag = "1")]
        String(StringRulesProto),
        #[prost(message, tag = "2")]
        Map(MapRulesProto),
    }

    #[derive(Clone, PartialEq, Message)]
    pub(crate) struct StringRulesProto {
        #[prost(uint32, optional, tag = "1")]
        pub(crate) min_len: Option<u32>,
        #[prost(uint32, optional, tag = "2")]
        pub(crate) max_len: Option<u32>,
        #[prost(bool, optional, tag = "3")]
        pub(crate) no_whitespace: Option<bool>,
    }

    #[derive(Clone, PartialEq, Message)]
    pub(crate) struct MapRulesProto {
        #[prost(bool, optional, tag = "1")]
        pub(crate) drop_blank: Option<bool>,
    }

    #[derive(Clone, PartialEq, Message)]
    struct FileSetProto {
        #[prost(message, repeated, tag = "1")]
        file: Vec<FileProto>,
    }

    #[derive(Clone, PartialEq, Message)]
    struct RequestFilesProto {
        #[prost(message, repeated, tag = "15")]
        proto_file: Vec<FileProto>,
    }

    /// Attaches string rules to a field
    pub(crate) fn string_rules(
        min_len: Option<u32>,
        max_len: Option<u32>,
        no_whitespace: Option<bool>,
    ) -> Option<FieldOptionsProto> {
        Some(FieldOptionsProto {
            rules: Some(FieldRulesProto {
                kind: Some(RuleKind::String(StringRulesProto {
                    min_len,
                    max_len,
                    no_whitespace,
                })),
            }),
        })
    }

    /// Attaches map rules to a field
    pub(crate) fn map_rules(drop_blank: Option<bool>) -> Option<FieldOptionsProto> {
        Some(FieldOptionsProto {
            rules: Some(FieldRulesProto {
                kind: Some(RuleKind::Map(MapRulesProto { drop_blank })),
            }),
        })
    }

    /// Attaches an empty `rules` option
    pub(crate) fn empty_rules() -> Option<FieldOptionsProto> {
        Some(FieldOptionsProto {
            rules: Some(FieldRulesProto { kind: None }),
        })
    }

    pub(crate) fn scalar_field(
        name: &str,
        number: i32,
        kind: Type,
        options: Option<FieldOptionsProto>,
    ) -> FieldProto {
        FieldProto {
            name: Some(name.to_string()),
            number: Some(number),
            label: Some(Label::Optional as i32),
            kind: Some(kind as i32),
            options,
            ..Default::default()
        }
    }

    pub(crate) fn repeated_field(
        name: &str,
        number: i32,
        kind: Type,
        options: Option<FieldOptionsProto>,
    ) -> FieldProto {
        FieldProto {
            label: Some(Label::Repeated as i32),
            ..scalar_field(name, number, kind, options)
        }
    }

    /// A proto2 `required` field
    pub(crate) fn required_field(
        name: &str,
        number: i32,
        kind: Type,
        options: Option<FieldOptionsProto>,
    ) -> FieldProto {
        FieldProto {
            label: Some(Label::Required as i32),
            ..scalar_field(name, number, kind, options)
        }
    }

    /// A string member of the real oneof at `oneof_index`
    pub(crate) fn oneof_field(
        name: &str,
        number: i32,
        oneof_index: i32,
        options: Option<FieldOptionsProto>,
    ) -> FieldProto {
        FieldProto {
            oneof_index: Some(oneof_index),
            ..scalar_field(name, number, Type::String, options)
        }
    }

    /// A proto3 `optional` field; `oneof_index` points at its synthetic oneof
    pub(crate) fn proto3_optional_field(
        name: &str,
        number: i32,
        oneof_index: i32,
        options: Option<FieldOptionsProto>,
    ) -> FieldProto {
        FieldProto {
            oneof_index: Some(oneof_index),
            proto3_optional: Some(true),
            ..scalar_field(name, number, Type::String, options)
        }
    }

    /// A `map<K, V>` field plus the entry message that must be nested next to it
    pub(crate) fn map_field(
        parent: &str,
        name: &str,
        number: i32,
        key: Type,
        value: Type,
        options: Option<FieldOptionsProto>,
    ) -> (FieldProto, MessageProto) {
        let entry_name = format!("{}Entry", name.to_upper_camel_case());
        let field = FieldProto {
            type_name: Some(format!(".{}.{}", parent, entry_name)),
            ..repeated_field(name, number, Type::Message, options)
        };
        let entry = MessageProto {
            name: Some(entry_name),
            field: vec![
                scalar_field("key", 1, key, None),
                scalar_field("value", 2, value, None),
            ],
            options: Some(MessageOptionsProto {
                map_entry: Some(true),
            }),
            ..Default::default()
        };
        (field, entry)
    }

    pub(crate) fn message_proto(name: &str, field: Vec<FieldProto>) -> MessageProto {
        MessageProto {
            name: Some(name.to_string()),
            field,
            ..Default::default()
        }
    }

    /// A proto3 file in package `package` importing `protonorm/validate.proto`
    pub(crate) fn user_file(name: &str, package: &str, messages: Vec<MessageProto>) -> FileProto {
        FileProto {
            name: Some(name.to_string()),
            package: Some(package.to_string()),
            dependency: vec!["protonorm/validate.proto".to_string()],
            message_type: messages,
            syntax: Some("proto3".to_string()),
        }
    }

    /// Like [`user_file`] but with proto2 syntax
    pub(crate) fn proto2_file(name: &str, package: &str, messages: Vec<MessageProto>) -> FileProto {
        FileProto {
            syntax: Some("proto2".to_string()),
            ..user_file(name, package, messages)
        }
    }

    /// `validator.proto`, matching [`validator_schema`](super::validator_schema)
    pub(crate) fn validator_file() -> FileProto {
        let name = message_proto(
            "Name",
            vec![scalar_field(
                "name",
                1,
                Type::String,
                string_rules(Some(3), Some(10), Some(true)),
            )],
        );

        let (tags_field, tags_entry) = map_field(
            "validator.Tags",
            "tags",
            1,
            Type::String,
            Type::String,
            map_rules(Some(true)),
        );
        let tags = MessageProto {
            nested_type: vec![tags_entry],
            ..message_proto("Tags", vec![tags_field])
        };

        let plain = message_proto("Plain", vec![scalar_field("note", 1, Type::String, None)]);

        let (labels_field, labels_entry) = map_field(
            "validator.Account",
            "labels",
            3,
            Type::String,
            Type::String,
            map_rules(None),
        );
        let account = MessageProto {
            nested_type: vec![labels_entry],
            oneof_decl: vec![OneofDescriptorProto {
                name: Some("_nickname".to_string()),
                options: None,
            }],
            ..message_proto(
                "Account",
                vec![
                    scalar_field(
                        "handle",
                        1,
                        Type::String,
                        string_rules(Some(3), Some(10), Some(true)),
                    ),
                    proto3_optional_field("nickname", 2, 0, string_rules(None, Some(8), None)),
                    labels_field,
                    scalar_field("age", 4, Type::Int32, None),
                ],
            )
        };

        user_file(
            "validator.proto",
            "validator",
            vec![name, tags, plain, account],
        )
    }

    /// Just enough of `descriptor.proto` to host the extension
    fn descriptor_file() -> FileDescriptorProto {
        FileDescriptorProto {
            name: Some("google/protobuf/descriptor.proto".to_string()),
            package: Some("google.protobuf".to_string()),
            message_type: vec![DescriptorProto {
                name: Some("FieldOptions".to_string()),
                extension_range: vec![ExtensionRange {
                    start: Some(1000),
                    end: Some(536_870_912),
                    options: None,
                }],
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    fn plain_field(name: &str, number: i32, kind: Type) -> FieldDescriptorProto {
        FieldDescriptorProto {
            name: Some(name.to_string()),
            number: Some(number),
            label: Some(Label::Optional as i32),
            r#type: Some(kind as i32),
            ..Default::default()
        }
    }

    fn message_field(name: &str, number: i32, type_name: &str) -> FieldDescriptorProto {
        FieldDescriptorProto {
            type_name: Some(type_name.to_string()),
            oneof_index: Some(0),
            ..plain_field(name, number, Type::Message)
        }
    }

    /// `protonorm/validate.proto`
    fn validate_file() -> FileDescriptorProto {
        FileDescriptorProto {
            name: Some("protonorm/validate.proto".to_string()),
            package: Some("protonorm".to_string()),
            dependency: vec!["google/protobuf/descriptor.proto".to_string()],
            message_type: vec![
                DescriptorProto {
                    name: Some("FieldRules".to_string()),
                    field: vec![
                        message_field("string", 1, ".protonorm.StringRules"),
                        message_field("map", 2, ".protonorm.MapRules"),
                    ],
                    oneof_decl: vec![OneofDescriptorProto {
                        name: Some("kind".to_string()),
                        options: None,
                    }],
                    ..Default::default()
                },
                DescriptorProto {
                    name: Some("StringRules".to_string()),
                    field: vec![
                        plain_field("min_len", 1, Type::Uint32),
                        plain_field("max_len", 2, Type::Uint32),
                        plain_field("no_whitespace", 3, Type::Bool),
                    ],
                    ..Default::default()
                },
                DescriptorProto {
                    name: Some("MapRules".to_string()),
                    field: vec![FieldDescriptorProto {
                        default_value: Some("true".to_string()),
                        ..plain_field("drop_blank", 1, Type::Bool)
                    }],
                    ..Default::default()
                },
            ],
            extension: vec![FieldDescriptorProto {
                type_name: Some(".protonorm.FieldRules".to_string()),
                extendee: Some(".google.protobuf.FieldOptions".to_string()),
                ..plain_field("rules", 51971, Type::Message)
            }],
            ..Default::default()
        }
    }

    /// A serialized `FileDescriptorSet` holding the support files and `files`
    pub(crate) fn descriptor_set(files: Vec<FileProto>) -> Vec<u8> {
        let mut bytes = FileDescriptorSet {
            file: vec![descriptor_file(), validate_file()],
        }
        .encode_to_vec();
        bytes.extend(FileSetProto { file: files }.encode_to_vec());
        bytes
    }

    /// A serialized `CodeGeneratorRequest` asking for `to_generate`
    pub(crate) fn plugin_request(
        to_generate: &[&str],
        parameter: Option<&str>,
        files: Vec<FileProto>,
    ) -> Vec<u8> {
        let mut bytes = CodeGeneratorRequest {
            file_to_generate: to_generate.iter().map(|s| s.to_string()).collect(),
            parameter: parameter.map(str::to_string),
            proto_file: vec![descriptor_file(), validate_file()],
            ..Default::default()
        }
        .encode_to_vec();
        bytes.extend(RequestFilesProto { proto_file: files }.encode_to_vec());
        bytes
    }
}
