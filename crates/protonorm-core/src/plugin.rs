//! protoc plugin driver.
//!
//! protoc hands a plugin a serialized `CodeGeneratorRequest` and expects a
//! `CodeGeneratorResponse` back. [`run`] does the whole round trip in memory;
//! the binary only moves bytes between stdin and stdout.
//!
//! Output is one file per proto package (see
//! [`SynthesizerConfig::output_filename`]). Packages are emitted in sorted
//! order and files within a package in request order, so identical requests
//! produce identical responses.

use crate::codegen::{SynthesizedFile, Synthesizer, SynthesizerConfig};
use crate::descriptor::{self, SchemaExtractor, DESCRIPTOR_SET_FILE_FIELD};
use crate::error::Result;
use crate::schema::FileSchema;
use prost::Message;
use prost_reflect::DescriptorPool;
use prost_types::compiler::code_generator_response::{Feature, File};
use prost_types::compiler::{CodeGeneratorRequest, CodeGeneratorResponse};
use std::collections::BTreeMap;
use tracing::{debug, error, info};

/// Field number of `CodeGeneratorRequest.proto_file`
pub const PROTO_FILE_FIELD: u32 = 15;

/// Handle one serialized `CodeGeneratorRequest`.
///
/// Never fails: generation errors are reported through the response's
/// `error` field, which is how protoc expects plugins to report them.
pub fn run(request: &[u8]) -> CodeGeneratorResponse {
    match generate(request) {
        Ok(files) => {
            info!("Generated {} file(s)", files.len());
            CodeGeneratorResponse {
                supported_features: Some(Feature::Proto3Optional as u64),
                file: files
                    .into_iter()
                    .map(|f| File {
                        name: Some(f.name),
                        content: Some(f.content),
                        ..Default::default()
                    })
                    .collect(),
                ..Default::default()
            }
        }
        Err(err) => {
            error!("Generation failed: {}", err);
            CodeGeneratorResponse {
                error: Some(err.to_string()),
                supported_features: Some(Feature::Proto3Optional as u64),
                ..Default::default()
            }
        }
    }
}

/// Generate the output files for one serialized `CodeGeneratorRequest`
pub fn generate(request: &[u8]) -> Result<Vec<SynthesizedFile>> {
    // prost-types drops unknown option extensions, so it is only trusted with
    // the plain fields; descriptors are re-read from the raw bytes below.
    let decoded = CodeGeneratorRequest::decode(request)?;
    let config = SynthesizerConfig::from_parameter(decoded.parameter.as_deref().unwrap_or(""))?;
    debug!(
        "Request for {} file(s), parameter {:?}",
        decoded.file_to_generate.len(),
        decoded.parameter
    );

    let pool = descriptor::pool_from_messages([request], PROTO_FILE_FIELD)?;
    generate_from_pool(&pool, &decoded.file_to_generate, &config)
}

/// Generate from serialized `FileDescriptorSet`s, as written by
/// `protoc --include_imports --descriptor_set_out`.
///
/// With an empty `files` list every file that carries at least one
/// constraint is generated.
pub fn generate_from_descriptor_sets<S: AsRef<[u8]>>(
    sets: &[S],
    files: &[String],
    config: &SynthesizerConfig,
) -> Result<Vec<SynthesizedFile>> {
    let pool = descriptor::pool_from_messages(
        sets.iter().map(|set| set.as_ref()),
        DESCRIPTOR_SET_FILE_FIELD,
    )?;
    generate_from_pool(&pool, files, config)
}

/// Generate from a decoded pool.
///
/// Files named in `files` always produce output, even if none of their
/// messages are validated.
pub fn generate_from_pool(
    pool: &DescriptorPool,
    files: &[String],
    config: &SynthesizerConfig,
) -> Result<Vec<SynthesizedFile>> {
    let extractor = SchemaExtractor::new(pool);

    let schemas: Vec<FileSchema> = if files.is_empty() {
        let mut schemas = Vec::new();
        for file in pool.files() {
            let schema = extractor.extract_file(file.name())?;
            if schema.has_constraints() {
                schemas.push(schema);
            }
        }
        schemas
    } else {
        files
            .iter()
            .map(|name| extractor.extract_file(name))
            .collect::<Result<_>>()?
    };

    let mut packages: BTreeMap<String, Vec<FileSchema>> = BTreeMap::new();
    for schema in schemas {
        packages.entry(schema.package.clone()).or_default().push(schema);
    }

    let synthesizer = Synthesizer::with_config(config.clone());
    packages
        .iter()
        .map(|(package, schemas)| synthesizer.synthesize(package, schemas))
        .collect()
}
