//! Action types and their parameter catalogs.

use std::str::FromStr;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use crate::field::{FieldDef, FieldType};
use crate::SchemaError;

const POINT: &[FieldType] = &[
    FieldType::Xywh,
    FieldType::IntPair,
    FieldType::True,
    FieldType::String,
];

const TARGET: FieldDef = FieldDef::new("target", POINT, "true");
const TARGET_OFFSET: FieldDef = FieldDef::new(
    "target_offset",
    &[FieldType::Xywh, FieldType::IntPair],
    "[0, 0, 0, 0]",
);
const LONG_PRESS_DURATION: FieldDef = FieldDef::new("duration", &[FieldType::Int], "1000");

const BEGIN: FieldDef = FieldDef::new("begin", POINT, "true");
const BEGIN_OFFSET: FieldDef = FieldDef::new("begin_offset", &[FieldType::Xywh], "[0, 0, 0, 0]");
const END: FieldDef = FieldDef::new(
    "end",
    &[
        FieldType::PositionList,
        FieldType::Xywh,
        FieldType::IntPair,
        FieldType::True,
        FieldType::String,
    ],
    "true",
);
const END_OFFSET: FieldDef = FieldDef::new(
    "end_offset",
    &[FieldType::XywhList, FieldType::Xywh],
    "[0, 0, 0, 0]",
);
const SWIPE_DURATION: FieldDef =
    FieldDef::new("duration", &[FieldType::IntList, FieldType::Int], "200");
const END_HOLD: FieldDef = FieldDef::new("end_hold", &[FieldType::IntList, FieldType::Int], "0");
const ONLY_HOVER: FieldDef = FieldDef::new("only_hover", &[FieldType::Bool], "false");

const SWIPES: FieldDef = FieldDef::new("swipes", &[FieldType::ObjectList], "[{}]").required();

const DX: FieldDef = FieldDef::new("dx", &[FieldType::Int], "0");
const DY: FieldDef = FieldDef::new("dy", &[FieldType::Int], "0");

const CONTACT: FieldDef = FieldDef::new("contact", &[FieldType::Int], "0");
const PRESSURE: FieldDef = FieldDef::new("pressure", &[FieldType::Int], "0");

const CLICK_KEY: FieldDef =
    FieldDef::new("key", &[FieldType::IntList, FieldType::Int], "1").required();
const KEY: FieldDef = FieldDef::new("key", &[FieldType::Int], "1").required();
const KEY_DURATION: FieldDef = FieldDef::new("duration", &[FieldType::Int], "1000");

const INPUT_TEXT: FieldDef = FieldDef::new("input_text", &[FieldType::String], r#""""#).required();
const PACKAGE: FieldDef = FieldDef::new("package", &[FieldType::String], r#""""#).required();

const EXEC: FieldDef = FieldDef::new("exec", &[FieldType::String], r#""""#).required();
const ARGS: FieldDef = FieldDef::new("args", &[FieldType::StringList, FieldType::String], "[]");
const DETACH: FieldDef = FieldDef::new("detach", &[FieldType::Bool], "false");
const CMD: FieldDef = FieldDef::new("cmd", &[FieldType::String], r#""""#).required();

const CUSTOM_ACTION: FieldDef =
    FieldDef::new("custom_action", &[FieldType::String], r#""""#).required();
const CUSTOM_ACTION_PARAM: FieldDef =
    FieldDef::new("custom_action_param", &[FieldType::Any], "{}");

/// Action performed by a pipeline node after recognition hits.
///
/// Parsing ignores ASCII case.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumIter, EnumString, IntoStaticStr)]
#[strum(ascii_case_insensitive)]
pub enum ActionType {
    #[default]
    DoNothing,
    Click,
    LongPress,
    Swipe,
    MultiSwipe,
    Scroll,
    TouchDown,
    TouchMove,
    TouchUp,
    ClickKey,
    LongPressKey,
    KeyDown,
    KeyUp,
    InputText,
    StartApp,
    StopApp,
    StopTask,
    Command,
    Shell,
    Custom,
    /// Deprecated spelling of [`ActionType::ClickKey`].
    Key,
}

impl ActionType {
    /// Type assumed when a document does not name one.
    pub const NOOP: Self = Self::DoNothing;

    /// Parses a type name, ignoring ASCII case.
    pub fn normalize(name: &str) -> Result<Self, SchemaError> {
        Self::from_str(name.trim()).map_err(|_| SchemaError::UnknownActionType(name.to_owned()))
    }

    /// Returns whether this is the no-op type.
    #[inline]
    pub fn is_noop(self) -> bool {
        self == Self::NOOP
    }

    /// Returns the canonical type name.
    #[inline]
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// Returns the parameter declarations for this type.
    pub fn params(self) -> &'static [FieldDef] {
        match self {
            Self::DoNothing | Self::StopTask => &[],
            Self::Click => &[TARGET, TARGET_OFFSET],
            Self::LongPress => &[TARGET, TARGET_OFFSET, LONG_PRESS_DURATION],
            Self::Swipe => &[
                BEGIN,
                BEGIN_OFFSET,
                END,
                END_OFFSET,
                SWIPE_DURATION,
                END_HOLD,
                ONLY_HOVER,
            ],
            Self::MultiSwipe => &[SWIPES],
            Self::Scroll => &[TARGET, TARGET_OFFSET, DX, DY],
            Self::TouchDown | Self::TouchMove => &[CONTACT, TARGET, TARGET_OFFSET, PRESSURE],
            Self::TouchUp => &[CONTACT],
            Self::ClickKey | Self::Key => &[CLICK_KEY],
            Self::LongPressKey => &[KEY, KEY_DURATION],
            Self::KeyDown | Self::KeyUp => &[KEY],
            Self::InputText => &[INPUT_TEXT],
            Self::StartApp | Self::StopApp => &[PACKAGE],
            Self::Command => &[EXEC, ARGS, DETACH],
            Self::Shell => &[CMD],
            Self::Custom => &[CUSTOM_ACTION, CUSTOM_ACTION_PARAM, TARGET, TARGET_OFFSET],
        }
    }

    /// Returns every parameter key declared by any action type.
    pub fn param_keys() -> &'static [&'static str] {
        static KEYS: OnceLock<Vec<&'static str>> = OnceLock::new();
        KEYS.get_or_init(|| {
            let mut keys = Vec::new();
            for def in Self::iter().flat_map(Self::params) {
                if !keys.contains(&def.key) {
                    keys.push(def.key);
                }
            }
            keys
        })
    }

    /// Returns whether `key` is an action parameter of any type.
    pub fn is_param_key(key: &str) -> bool {
        Self::param_keys().contains(&key)
    }
}
