//! Export settings.

#[cfg(feature = "config")]
use clap::Args;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::ProtocolVersion;

/// How `[Anchor]`/`[JumpBack]` reference attributes are written.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Serialize, Deserialize, AsRefStr, Display, EnumString)]
#[cfg_attr(feature = "config", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AttrStyle {
    /// `"[Anchor][JumpBack]Name"`.
    #[default]
    Prefix,
    /// `{"name": "Name", "anchor": true, "jump_back": true}`.
    Object,
}

/// Settings controlling document export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Builder)]
#[cfg_attr(feature = "config", derive(Args))]
#[builder(
    name = "ExportSettingsBuilder",
    pattern = "owned",
    setter(into, prefix = "with"),
    build_fn(validate = "Self::validate")
)]
pub struct ExportSettings {
    /// Write editor metadata: file config entry, node positions and stubs.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "export-config",
            env = "MPE_EXPORT_CONFIG",
            default_value_t = true,
            action = clap::ArgAction::Set
        )
    )]
    #[builder(default = "true")]
    #[serde(default = "default_export_config")]
    pub export_config: bool,

    /// Write recognition and action even when they are the no-op type with no
    /// parameters.
    #[cfg_attr(
        feature = "config",
        arg(long = "export-defaults", env = "MPE_EXPORT_DEFAULTS")
    )]
    #[builder(default)]
    #[serde(default)]
    pub export_defaults: bool,

    /// Protocol version of the written document.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "protocol-version",
            env = "MPE_PROTOCOL_VERSION",
            value_enum,
            default_value_t = ProtocolVersion::V2
        )
    )]
    #[builder(default)]
    #[serde(default)]
    pub protocol_version: ProtocolVersion,

    /// Style of reference attributes in connection arrays.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "attr-style",
            env = "MPE_ATTR_STYLE",
            value_enum,
            default_value_t = AttrStyle::Prefix
        )
    )]
    #[builder(default)]
    #[serde(default)]
    pub attr_style: AttrStyle,

    /// Tool version recorded in the file config entry as `v<version>`.
    #[cfg_attr(feature = "config", arg(skip = default_tool_version()))]
    #[builder(default = "default_tool_version()")]
    #[serde(default = "default_tool_version")]
    pub tool_version: String,
}

fn default_export_config() -> bool {
    true
}

fn default_tool_version() -> String {
    env!("CARGO_PKG_VERSION").to_owned()
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            export_config: default_export_config(),
            export_defaults: false,
            protocol_version: ProtocolVersion::default(),
            attr_style: AttrStyle::default(),
            tool_version: default_tool_version(),
        }
    }
}

impl ExportSettings {
    /// Creates a new settings builder.
    pub fn builder() -> ExportSettingsBuilder {
        ExportSettingsBuilder::default()
    }
}

impl ExportSettingsBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(version) = &self.tool_version
            && version.trim().is_empty()
        {
            return Err("Tool version must not be empty".to_string());
        }

        Ok(())
    }
}
