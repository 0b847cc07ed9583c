// @generated by protoc-gen-protonorm. DO NOT EDIT.
// source: validator.proto

impl ::protonorm_core::Validate for Name {
    fn validate(&mut self) -> ::protonorm_core::Verdict {
        let mut verdict = ::protonorm_core::Verdict::default();
        verdict.absorb(::protonorm_core::normalize_string(
            "name",
            &mut self.name,
            &::protonorm_core::StringRules {
                trim: true,
                min_len: ::core::option::Option::Some(3),
                max_len: ::core::option::Option::Some(10),
                reject_whitespace: true,
            },
        ));
        verdict
    }
}

impl ::protonorm_core::Validate for Tags {
    fn validate(&mut self) -> ::protonorm_core::Verdict {
        let mut verdict = ::protonorm_core::Verdict::default();
        verdict.absorb(::protonorm_core::normalize_map(
            &mut self.tags,
            &::protonorm_core::MapRules {
                trim: true,
                drop_blank: true,
            },
        ));
        verdict
    }
}

impl ::protonorm_core::Validate for Account {
    fn validate(&mut self) -> ::protonorm_core::Verdict {
        let mut verdict = ::protonorm_core::Verdict::default();
        verdict.absorb(::protonorm_core::normalize_string(
            "handle",
            &mut self.handle,
            &::protonorm_core::StringRules {
                trim: true,
                min_len: ::core::option::Option::Some(3),
                max_len: ::core::option::Option::Some(10),
                reject_whitespace: true,
            },
        ));
        if verdict.is_err() {
            return verdict;
        }
        verdict.absorb(::protonorm_core::normalize_optional_string(
            "nickname",
            &mut self.nickname,
            &::protonorm_core::StringRules {
                trim: true,
                min_len: ::core::option::Option::None,
                max_len: ::core::option::Option::Some(8),
                reject_whitespace: false,
            },
        ));
        if verdict.is_err() {
            return verdict;
        }
        verdict.absorb(::protonorm_core::normalize_map(
            &mut self.labels,
            &::protonorm_core::MapRules {
                trim: true,
                drop_blank: true,
            },
        ));
        verdict
    }
}
