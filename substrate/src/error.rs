use std::fmt::{Debug, Display};
use std::path::PathBuf;

use thiserror::Error;

use crate::deps::arcstr::ArcStr;
use crate::layout::layers::LayerMapError;
use crate::pdk::annotate::error::AnnotateError;
use crate::pdk::compliance::error::ComplianceError;
use crate::pdk::rules::error::RuleError;

pub type Result<T> = std::result::Result<T, SubstrateError>;

pub struct SubstrateError {
    pub(crate) source: ErrorSource,
    pub(crate) context: Vec<ErrorContext>,
}

impl SubstrateError {
    pub fn source(&self) -> &ErrorSource {
        &self.source
    }

    /// The context stack, innermost first.
    pub fn context(&self) -> &[ErrorContext] {
        &self.context
    }
}

impl std::error::Error for SubstrateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

impl Display for SubstrateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Error:\n{}", self.source)?;
        if !self.context.is_empty() {
            writeln!(f, "\nError occurred:")?;
            for item in self.context.iter() {
                writeln!(f, "\twhile {}", item)?;
            }
        }
        Ok(())
    }
}

impl Debug for SubstrateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.source)?;
        if !self.context.is_empty() {
            writeln!(f, "\nError occurred:")?;
            for (i, item) in self.context.iter().enumerate() {
                writeln!(f, "\t{}: {:?}", i, item)?;
            }
        }
        Ok(())
    }
}

impl<T> From<T> for SubstrateError
where
    T: Into<ErrorSource>,
{
    fn from(value: T) -> Self {
        Self {
            source: value.into(),
            context: Vec::new(),
        }
    }
}

impl SubstrateError {
    pub fn new(source: impl Into<ErrorSource>) -> Self {
        Self {
            source: source.into(),
            context: Vec::new(),
        }
    }

    pub fn from_context(source: impl Into<ErrorSource>, ctx: impl Into<ErrorContext>) -> Self {
        Self {
            source: source.into(),
            context: vec![ctx.into()],
        }
    }

    pub fn with_context(mut self, ctx: impl Into<ErrorContext>) -> Self {
        self.context.push(ctx.into());
        self
    }

    #[inline]
    pub fn into_inner(self) -> ErrorSource {
        self.source
    }
}

#[inline]
pub fn with_err_context<T, E, C>(result: std::result::Result<T, E>, ctx: C) -> Result<T>
where
    C: FnOnce() -> ErrorContext,
    E: Into<SubstrateError>,
{
    result.map_err(|err| err.into().with_context(ctx()))
}

#[derive(Debug, Clone, Eq, PartialEq)]
#[non_exhaustive]
pub enum ErrorContext {
    BuildTechnology(ArcStr),
    ValidateLayers(ArcStr),
    AnnotatePrimitive {
        primitive: ArcStr,
    },
    LabelCell {
        cell: ArcStr,
        target: ArcStr,
    },
    ReadFile(PathBuf),
    Task(ArcStr),
}

impl Display for ErrorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use ErrorContext::*;
        match self {
            BuildTechnology(name) => write!(f, "building technology {name}"),
            ValidateLayers(name) => write!(f, "validating layer map of technology {name}"),
            AnnotatePrimitive { primitive } => write!(f, "annotating primitive {primitive}"),
            LabelCell { cell, target } => write!(f, "adding {target} labels to cell {cell}"),
            ReadFile(path) => write!(f, "reading file {path:?}"),
            Task(task) => write!(f, "{task}"),
        }
    }
}

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ErrorSource {
    #[error("internal error: {0}")]
    Internal(String),

    #[error("invalid design rules: {0}")]
    Rules(#[from] RuleError),

    #[error("invalid layer map: {0}")]
    LayerMap(#[from] LayerMapError),

    #[error("error annotating primitive layout: {0}")]
    Annotate(#[from] AnnotateError),

    #[error("layout compliance check failed: {0}")]
    Compliance(#[from] ComplianceError),

    #[error("no such layer: {0}")]
    LayerNotFound(String),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("error parsing CSV: {0}")]
    CsvParsing(#[from] csv::Error),

    #[error("error parsing TOML: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("error writing TOML: {0}")]
    TomlWriting(#[from] toml::ser::Error),

    #[error("unexpected error: {0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}
