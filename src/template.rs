//! Typed page templates: module descriptors, rows, overrides, resolution.
//!
//! A template describes the rows of a right-hand page (and optionally a
//! distinct left-hand page), each row holding its module descriptors
//! inline. Per-build field overrides are applied by a pure merge that
//! returns a new template; nothing mutates a shared structure.

use serde::{Deserialize, Serialize};

use crate::error::TemplateError;
use crate::location::Language;

/// Which physical page side is being rendered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageSide {
    /// Right-hand (recto) page; builds start here.
    Right,
    /// Left-hand (verso) page.
    Left,
}

impl PageSide {
    /// The other side.
    pub fn flipped(self) -> Self {
        match self {
            Self::Right => Self::Left,
            Self::Left => Self::Right,
        }
    }
}

/// How a module's range is chosen.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RangeSpec {
    /// Follow the main module's resolved ranges.
    #[default]
    All,
    /// An explicit range expression, e.g. `"3.2-3.10"`.
    Expr(String),
}

impl From<String> for RangeSpec {
    fn from(value: String) -> Self {
        if value == "all" {
            Self::All
        } else {
            Self::Expr(value)
        }
    }
}

impl From<RangeSpec> for String {
    fn from(value: RangeSpec) -> Self {
        match value {
            RangeSpec::All => "all".to_string(),
            RangeSpec::Expr(expression) => expression,
        }
    }
}

/// One configured text stream: a main text or a commentary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModuleConfig {
    /// Remote reference this module reads.
    pub source: String,
    /// Display title for the module heading.
    pub title: String,
    /// Which text stream to render.
    pub language: Language,
    /// Range selection.
    pub range: RangeSpec,
    /// Marks the single main text of the document.
    pub main: bool,
    /// Commentary whose range follows a validated base-text link.
    pub accompany: bool,
    /// Multiplier on the body text size.
    pub font_scale: f32,
    /// Font family name handed through to the surface.
    pub font: String,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            source: String::new(),
            title: "Source".to_string(),
            language: Language::Primary,
            range: RangeSpec::All,
            main: false,
            accompany: false,
            font_scale: 1.0,
            font: "default".to_string(),
        }
    }
}

impl ModuleConfig {
    /// New config with `overrides` applied; unset fields keep their value.
    pub fn merged(&self, overrides: &ModuleOverrides) -> Self {
        Self {
            source: overrides.source.clone().unwrap_or_else(|| self.source.clone()),
            title: overrides.title.clone().unwrap_or_else(|| self.title.clone()),
            language: overrides.language.unwrap_or(self.language),
            range: overrides.range.clone().unwrap_or_else(|| self.range.clone()),
            main: overrides.main.unwrap_or(self.main),
            accompany: overrides.accompany.unwrap_or(self.accompany),
            font_scale: overrides.font_scale.unwrap_or(self.font_scale),
            font: overrides.font.clone().unwrap_or_else(|| self.font.clone()),
        }
    }
}

/// Optional per-module field overrides.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct ModuleOverrides {
    pub source: Option<String>,
    pub title: Option<String>,
    pub language: Option<Language>,
    pub range: Option<RangeSpec>,
    pub main: Option<bool>,
    pub accompany: Option<bool>,
    pub font_scale: Option<f32>,
    pub font: Option<String>,
}

/// One template row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RowConfig {
    /// Page chrome: title in the center, page number on the outer edge.
    Header,
    /// One full-width module.
    Single(ModuleConfig),
    /// Two side-by-side modules splitting the row width.
    #[serde(rename_all = "camelCase")]
    Double {
        /// Module bound to the left column.
        left: ModuleConfig,
        /// Module bound to the right column.
        right: ModuleConfig,
        /// Left column share of the row width, in percent.
        #[serde(default = "default_spacing")]
        spacing: u8,
    },
}

fn default_spacing() -> u8 {
    50
}

/// Overrides for one row, shaped like the row kind they target.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowOverrides {
    /// Overrides for a single-module row.
    Single(ModuleOverrides),
    /// Overrides for a double row.
    #[serde(rename_all = "camelCase")]
    Double {
        #[serde(default)]
        left: Option<ModuleOverrides>,
        #[serde(default)]
        right: Option<ModuleOverrides>,
        #[serde(default)]
        spacing: Option<u8>,
    },
}

/// Per-build overrides for both page sides.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateOverrides {
    /// Row overrides for the right page, positionally matched.
    pub right: Vec<RowOverrides>,
    /// Row overrides for the left page; ignored for mirror-page templates.
    pub left: Vec<RowOverrides>,
}

/// A document's page structure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageTemplate {
    /// Rows of right-hand pages.
    pub right: Vec<RowConfig>,
    /// Rows of left-hand pages; unused when `mirror_page` is set.
    #[serde(default)]
    pub left: Vec<RowConfig>,
    /// Left pages reuse the right rows with the sides swapped.
    #[serde(default)]
    pub mirror_page: bool,
}

impl PageTemplate {
    /// Decode a template from JSON.
    pub fn from_json(json: &str) -> Result<Self, crate::error::Error> {
        Ok(serde_json::from_str(json)?)
    }

    /// Apply per-build overrides, returning a new template.
    ///
    /// Overrides match rows positionally; a missing or kind-mismatched
    /// entry leaves the row unchanged, extras are ignored. Left-page
    /// overrides are skipped for mirror-page templates, which have no
    /// distinct left rows.
    pub fn with_overrides(&self, overrides: &TemplateOverrides) -> Self {
        let mut merged = self.clone();
        apply_row_overrides(&mut merged.right, &overrides.right);
        if !merged.mirror_page {
            apply_row_overrides(&mut merged.left, &overrides.left);
        }
        merged
    }
}

fn apply_row_overrides(rows: &mut [RowConfig], overrides: &[RowOverrides]) {
    for (row, row_overrides) in rows.iter_mut().zip(overrides) {
        match (row, row_overrides) {
            (RowConfig::Single(module), RowOverrides::Single(m)) => {
                *module = module.merged(m);
            }
            (
                RowConfig::Double {
                    left,
                    right,
                    spacing,
                },
                RowOverrides::Double {
                    left: left_overrides,
                    right: right_overrides,
                    spacing: spacing_override,
                },
            ) => {
                if let Some(m) = left_overrides {
                    *left = left.merged(m);
                }
                if let Some(m) = right_overrides {
                    *right = right.merged(m);
                }
                if let Some(s) = spacing_override {
                    *spacing = *s;
                }
            }
            _ => {}
        }
    }
}

/// A validated template with the main module resolved directly.
#[derive(Clone, Debug)]
pub struct ResolvedTemplate {
    template: PageTemplate,
    main: ModuleConfig,
}

impl ResolvedTemplate {
    /// Validate `template`: exactly one module marked main across the
    /// sides the template actually uses, and no double row binding the
    /// same source to both columns.
    pub fn resolve(template: PageTemplate) -> Result<Self, TemplateError> {
        for row in template.right.iter().chain(&template.left) {
            if let RowConfig::Double { left, right, .. } = row {
                if left.source == right.source {
                    return Err(TemplateError::DuplicateModule(left.source.clone()));
                }
            }
        }
        let mains: Vec<&ModuleConfig> = modules_of(&template).into_iter().filter(|m| m.main).collect();
        let main = match mains.as_slice() {
            [] => return Err(TemplateError::NoMainModule),
            [main] => (*main).clone(),
            found => return Err(TemplateError::MultipleMainModules(found.len())),
        };
        Ok(Self { template, main })
    }

    /// The underlying template.
    pub fn template(&self) -> &PageTemplate {
        &self.template
    }

    /// The main module, referenced directly rather than searched for.
    pub fn main(&self) -> &ModuleConfig {
        &self.main
    }

    /// All modules on the sides the template uses, in fill order.
    pub fn modules(&self) -> Vec<&ModuleConfig> {
        modules_of(&self.template)
    }

    /// The rows rendered for `side`, and whether they are mirrored.
    ///
    /// A mirror-page template reuses its right rows on left pages with the
    /// column bindings swapped; the caller applies the swap.
    pub fn rows_for(&self, side: PageSide) -> (&[RowConfig], bool) {
        match side {
            PageSide::Right => (&self.template.right, false),
            PageSide::Left => {
                if self.template.mirror_page {
                    (&self.template.right, true)
                } else {
                    (&self.template.left, false)
                }
            }
        }
    }
}

fn modules_of(template: &PageTemplate) -> Vec<&ModuleConfig> {
    let left: &[RowConfig] = if template.mirror_page {
        &[]
    } else {
        &template.left
    };
    let mut modules = Vec::new();
    for row in template.right.iter().chain(left) {
        match row {
            RowConfig::Header => {}
            RowConfig::Single(module) => modules.push(module),
            RowConfig::Double { left, right, .. } => {
                modules.push(left);
                modules.push(right);
            }
        }
    }
    modules
}
