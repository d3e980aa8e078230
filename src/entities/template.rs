//! Template Expansion
//!
//! Template strings are parsed into literal text and a closed set of
//! [`Slot`]s. Expansion substitutes every slot from [`TemplateParams`]; a slot
//! without a value fails the expansion instead of leaving a raw `{...}` behind.

use super::{MetricDescriptor, MetricTemplate};
use crate::format::SemanticKind;
use std::borrow::Cow;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("unknown placeholder '{{{name}}}' in '{template}'")]
    UnknownPlaceholder { name: String, template: String },

    #[error("unbalanced braces in '{0}'")]
    Malformed(String),

    #[error("no value for placeholder '{{{slot}}}' in '{template}'")]
    MissingParameter { slot: Slot, template: String },
}

/// Placeholder names a template may use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    PrefixKey,
    PrefixName,
    I,
    SeriesIndex,
    Endpoint,
    PoolIndex,
    Category,
}

impl Slot {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "prefix_key" => Some(Self::PrefixKey),
            "prefix_name" => Some(Self::PrefixName),
            "i" => Some(Self::I),
            "series_index" => Some(Self::SeriesIndex),
            "endpoint" => Some(Self::Endpoint),
            "pool_index" => Some(Self::PoolIndex),
            "category" => Some(Self::Category),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::PrefixKey => "prefix_key",
            Self::PrefixName => "prefix_name",
            Self::I => "i",
            Self::SeriesIndex => "series_index",
            Self::Endpoint => "endpoint",
            Self::PoolIndex => "pool_index",
            Self::Category => "category",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Values available to one expansion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateParams {
    pub prefix_key: Option<String>,
    pub prefix_name: Option<String>,
    pub i: Option<usize>,
    pub series_index: Option<usize>,
    pub endpoint: Option<String>,
    pub pool_index: Option<usize>,
    pub category: Option<String>,
}

impl TemplateParams {
    fn value(&self, slot: Slot) -> Option<Cow<'_, str>> {
        match slot {
            Slot::PrefixKey => self.prefix_key.as_deref().map(Cow::Borrowed),
            Slot::PrefixName => self.prefix_name.as_deref().map(Cow::Borrowed),
            Slot::I => self.i.map(|v| Cow::Owned(v.to_string())),
            Slot::SeriesIndex => self.series_index.map(|v| Cow::Owned(v.to_string())),
            Slot::Endpoint => self.endpoint.as_deref().map(Cow::Borrowed),
            Slot::PoolIndex => self.pool_index.map(|v| Cow::Owned(v.to_string())),
            Slot::Category => self.category.as_deref().map(Cow::Borrowed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece<'a> {
    Literal(&'a str),
    Slot(Slot),
}

fn parse(template: &str) -> Result<Vec<Piece<'_>>, TemplateError> {
    let mut pieces = Vec::new();
    let mut rest = template;

    while let Some(open) = rest.find(['{', '}']) {
        if rest[open..].starts_with('}') {
            return Err(TemplateError::Malformed(template.to_string()));
        }
        if open > 0 {
            pieces.push(Piece::Literal(&rest[..open]));
        }
        let after = &rest[open + 1..];
        let close = after
            .find('}')
            .ok_or_else(|| TemplateError::Malformed(template.to_string()))?;
        let name = &after[..close];
        let slot = Slot::from_name(name).ok_or_else(|| TemplateError::UnknownPlaceholder {
            name: name.to_string(),
            template: template.to_string(),
        })?;
        pieces.push(Piece::Slot(slot));
        rest = &after[close + 1..];
    }

    if !rest.is_empty() {
        pieces.push(Piece::Literal(rest));
    }
    Ok(pieces)
}

/// Substitute every placeholder of a single template string
pub fn render(template: &str, params: &TemplateParams) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len() + 16);
    for piece in parse(template)? {
        match piece {
            Piece::Literal(text) => out.push_str(text),
            Piece::Slot(slot) => {
                let value = params
                    .value(slot)
                    .ok_or_else(|| TemplateError::MissingParameter {
                        slot,
                        template: template.to_string(),
                    })?;
                out.push_str(&value);
            }
        }
    }
    Ok(out)
}

/// Expand one template into a concrete descriptor
pub fn expand_one(
    template: &MetricTemplate,
    params: &TemplateParams,
) -> Result<MetricDescriptor, TemplateError> {
    let display_name = render(template.display_name, params)?;
    let kind = SemanticKind::classify(template.unit_hint, &display_name, template.status_table);

    Ok(MetricDescriptor {
        key: render(template.key, params)?,
        display_name,
        icon: template.icon,
        endpoint: render(template.endpoint, params)?,
        extraction_path: render(template.extraction_path, params)?,
        unit_hint: template.unit_hint,
        decimal_places: template.decimal_places,
        request_method: template.request_method,
        category: render(template.category, params)?,
        kind,
    })
}

/// Expand templates in order; the first failing template aborts the expansion.
pub fn expand(
    templates: &[MetricTemplate],
    params: &TemplateParams,
) -> Result<Vec<MetricDescriptor>, TemplateError> {
    templates
        .iter()
        .map(|template| expand_one(template, params))
        .collect()
}
