//! Rust source synthesis.
//!
//! The [`Synthesizer`] turns decoded [`FileSchema`]s into `impl Validate`
//! blocks for the prost structs of one package. The output is meant to be
//! `include!`d into the same module as the prost output.
//!
//! ## Architecture
//!
//! Synthesis runs in two steps per message:
//!
//! 1. Every constrained field is paired with its shape. The pairing is an
//!    exhaustive match, so a constraint on a shape that cannot carry it is a
//!    hard error rather than a skipped field.
//! 2. The resulting plan is written out with constraint values baked in as
//!    literals.
//!
//! Synthesis depends on nothing but its inputs and the immutable
//! [`SynthesizerConfig`]; the same inputs always produce the same bytes.

pub mod naming;

use crate::constraint::{Constraint, MapRules, StringRules};
use crate::error::{Error, Result};
use crate::schema::{FieldSchema, FieldShape, FileSchema, MessageSchema};
use std::fmt::Write as FmtWrite;
use tracing::{debug, trace};

/// Default path of the runtime crate in generated code
pub const DEFAULT_RUNTIME_PATH: &str = "::protonorm_core";

/// Default suffix appended to the package name to form the output file name
pub const DEFAULT_FILE_SUFFIX: &str = ".validate.rs";

/// Configuration for source synthesis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizerConfig {
    /// Path under which generated code finds the runtime
    pub runtime_path: String,
    /// Output file suffix
    pub file_suffix: String,
    /// Indentation string (default: 4 spaces)
    pub indent_str: String,
}

impl Default for SynthesizerConfig {
    fn default() -> Self {
        Self {
            runtime_path: DEFAULT_RUNTIME_PATH.to_string(),
            file_suffix: DEFAULT_FILE_SUFFIX.to_string(),
            indent_str: "    ".to_string(),
        }
    }
}

impl SynthesizerConfig {
    /// Creates a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the runtime path
    pub fn runtime_path(mut self, path: impl Into<String>) -> Self {
        self.runtime_path = path.into();
        self
    }

    /// Sets the output file suffix
    pub fn file_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.file_suffix = suffix.into();
        self
    }

    /// Sets the indentation string
    pub fn indent_str(mut self, s: impl Into<String>) -> Self {
        self.indent_str = s.into();
        self
    }

    /// Parses a protoc plugin parameter (`key=value,key=value`)
    pub fn from_parameter(parameter: &str) -> Result<Self> {
        let mut config = Self::default();

        for pair in parameter.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| Error::invalid_parameter(pair, "expected key=value"))?;
            let value = value.trim();
            if value.is_empty() {
                return Err(Error::invalid_parameter(pair, "value must not be empty"));
            }

            match key.trim() {
                "runtime_path" => config.runtime_path = value.to_string(),
                "file_suffix" => config.file_suffix = value.to_string(),
                other => {
                    return Err(Error::invalid_parameter(
                        pair,
                        format!("unknown key '{}'", other),
                    ))
                }
            }
        }

        Ok(config)
    }

    /// Returns the output file name for a package
    pub fn output_filename(&self, package: &str) -> String {
        format!("{}{}", naming::package_file_stem(package), self.file_suffix)
    }
}

/// Counters describing one synthesized file
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GenerationStats {
    /// Messages that received an `impl Validate`
    pub messages: usize,
    /// Fields validated across those messages
    pub fields: usize,
}

/// One generated source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedFile {
    /// Output file name
    pub name: String,
    /// Rust source
    pub content: String,
    /// What went into it
    pub stats: GenerationStats,
}

/// Generates validation impls from decoded schemas
#[derive(Debug, Clone, Default)]
pub struct Synthesizer {
    config: SynthesizerConfig,
}

impl Synthesizer {
    /// Creates a synthesizer with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a synthesizer with custom configuration
    pub fn with_config(config: SynthesizerConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration
    pub fn config(&self) -> &SynthesizerConfig {
        &self.config
    }

    /// Generates the source file for one package.
    ///
    /// `files` are the schema files of that package, in generation order.
    pub fn synthesize(&self, package: &str, files: &[FileSchema]) -> Result<SynthesizedFile> {
        let mut content = String::new();
        let mut stats = GenerationStats::default();
        let mut writer = RustWriter::new(&mut content, &self.config);

        writer.write_header(files).map_err(fmt_error)?;

        for file in files {
            for message in &file.messages {
                let plan = plan_message(message)?;
                if plan.is_empty() {
                    trace!("No validated fields in {}", message.full_name);
                    continue;
                }

                writer.write_impl(message, &plan).map_err(fmt_error)?;
                stats.messages += 1;
                stats.fields += plan.len();
            }
        }

        let name = self.config.output_filename(package);
        debug!(
            "Synthesized {}: {} message(s), {} field(s)",
            name, stats.messages, stats.fields
        );

        Ok(SynthesizedFile {
            name,
            content,
            stats,
        })
    }

    /// Generates the `impl` block for a single message.
    ///
    /// Returns `None` if the message has no validated fields.
    pub fn synthesize_message(&self, message: &MessageSchema) -> Result<Option<String>> {
        let plan = plan_message(message)?;
        if plan.is_empty() {
            return Ok(None);
        }

        let mut output = String::new();
        RustWriter::new(&mut output, &self.config)
            .write_impl(message, &plan)
            .map_err(fmt_error)?;
        Ok(Some(output))
    }
}

fn fmt_error(_: std::fmt::Error) -> Error {
    Error::internal("failed to format generated source")
}

/// A constrained field paired with the shape that carries it
#[derive(Debug, Clone, Copy)]
enum FieldPlan<'a> {
    Scalar {
        field: &'a FieldSchema,
        rules: StringRules,
        optional: bool,
    },
    Map {
        field: &'a FieldSchema,
        rules: MapRules,
    },
}

fn plan_message(message: &MessageSchema) -> Result<Vec<FieldPlan<'_>>> {
    let mut plan = Vec::new();
    for field in &message.fields {
        if let Some(step) = plan_field(message, field)? {
            plan.push(step);
        }
    }
    Ok(plan)
}

fn plan_field<'a>(
    message: &MessageSchema,
    field: &'a FieldSchema,
) -> Result<Option<FieldPlan<'a>>> {
    let Some(constraint) = field.constraint else {
        return Ok(None);
    };

    match (&field.shape, constraint) {
        (FieldShape::ScalarString { explicit_presence }, Constraint::ScalarString(rules)) => {
            if rules.is_unsatisfiable() {
                return Err(Error::invalid_constraint(
                    &message.full_name,
                    &field.name,
                    format!(
                        "min_len {} is greater than max_len {}",
                        rules.min_len.unwrap_or_default(),
                        rules.max_len.unwrap_or_default()
                    ),
                ));
            }
            Ok(Some(FieldPlan::Scalar {
                field,
                rules,
                optional: *explicit_presence,
            }))
        }
        (FieldShape::StringMap, Constraint::StringMap(rules)) => {
            Ok(Some(FieldPlan::Map { field, rules }))
        }
        (shape, constraint) => Err(Error::unsupported_field_kind(
            &message.full_name,
            &field.name,
            format!("{} rules on a {} field", constraint.kind(), shape.describe()),
        )),
    }
}

/// Writes Rust source with indentation tracking
struct RustWriter<'a, W: FmtWrite> {
    writer: &'a mut W,
    config: &'a SynthesizerConfig,
    indent_level: usize,
}

impl<'a, W: FmtWrite> RustWriter<'a, W> {
    fn new(writer: &'a mut W, config: &'a SynthesizerConfig) -> Self {
        Self {
            writer,
            config,
            indent_level: 0,
        }
    }

    fn indent(&mut self) {
        self.indent_level += 1;
    }

    fn dedent(&mut self) {
        self.indent_level = self.indent_level.saturating_sub(1);
    }

    fn write_indent(&mut self) -> std::fmt::Result {
        for _ in 0..self.indent_level {
            write!(self.writer, "{}", self.config.indent_str)?;
        }
        Ok(())
    }

    fn writeln(&mut self, s: &str) -> std::fmt::Result {
        self.write_indent()?;
        writeln!(self.writer, "{}", s)
    }

    fn write_header(&mut self, files: &[FileSchema]) -> std::fmt::Result {
        writeln!(
            self.writer,
            "// @generated by protoc-gen-protonorm. DO NOT EDIT."
        )?;
        for file in files {
            writeln!(self.writer, "// source: {}", file.name)?;
        }
        Ok(())
    }

    fn write_impl(&mut self, message: &MessageSchema, plan: &[FieldPlan<'_>]) -> std::fmt::Result {
        let rt = self.config.runtime_path.clone();

        writeln!(self.writer)?;
        self.writeln(&format!(
            "impl {}::Validate for {} {{",
            rt, message.rust_path
        ))?;
        self.indent();
        self.writeln(&format!("fn validate(&mut self) -> {}::Verdict {{", rt))?;
        self.indent();
        self.writeln(&format!("let mut verdict = {}::Verdict::default();", rt))?;

        for (i, step) in plan.iter().enumerate() {
            if i > 0 {
                self.writeln("if verdict.is_err() {")?;
                self.indent();
                self.writeln("return verdict;")?;
                self.dedent();
                self.writeln("}")?;
            }
            match step {
                FieldPlan::Scalar {
                    field,
                    rules,
                    optional,
                } => self.write_scalar(&rt, field, rules, *optional)?,
                FieldPlan::Map { field, rules } => self.write_map(&rt, field, rules)?,
            }
        }

        self.writeln("verdict")?;
        self.dedent();
        self.writeln("}")?;
        self.dedent();
        self.writeln("}")
    }

    fn write_scalar(
        &mut self,
        rt: &str,
        field: &FieldSchema,
        rules: &StringRules,
        optional: bool,
    ) -> std::fmt::Result {
        let routine = if optional {
            "normalize_optional_string"
        } else {
            "normalize_string"
        };

        self.writeln(&format!("verdict.absorb({}::{}(", rt, routine))?;
        self.indent();
        self.writeln(&format!("{:?},", field.name))?;
        self.writeln(&format!("&mut self.{},", field.rust_ident))?;
        self.writeln(&format!("&{}::StringRules {{", rt))?;
        self.indent();
        self.writeln(&format!("trim: {},", rules.trim))?;
        self.writeln(&format!("min_len: {},", option_literal(rules.min_len)))?;
        self.writeln(&format!("max_len: {},", option_literal(rules.max_len)))?;
        self.writeln(&format!("reject_whitespace: {},", rules.reject_whitespace))?;
        self.dedent();
        self.writeln("},")?;
        self.dedent();
        self.writeln("));")
    }

    fn write_map(&mut self, rt: &str, field: &FieldSchema, rules: &MapRules) -> std::fmt::Result {
        self.writeln(&format!("verdict.absorb({}::normalize_map(", rt))?;
        self.indent();
        self.writeln(&format!("&mut self.{},", field.rust_ident))?;
        self.writeln(&format!("&{}::MapRules {{", rt))?;
        self.indent();
        self.writeln(&format!("trim: {},", rules.trim))?;
        self.writeln(&format!("drop_blank: {},", rules.drop_blank))?;
        self.dedent();
        self.writeln("},")?;
        self.dedent();
        self.writeln("));")
    }
}

fn option_literal(value: Option<usize>) -> String {
    match value {
        Some(v) => format!("::core::option::Option::Some({})", v),
        None => "::core::option::Option::None".to_string(),
    }
}
