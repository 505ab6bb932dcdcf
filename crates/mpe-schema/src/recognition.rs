//! Recognition types and their parameter catalogs.

use std::str::FromStr;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use crate::field::{FieldDef, FieldType};
use crate::SchemaError;

const ROI: FieldDef = FieldDef::new("roi", &[FieldType::Xywh, FieldType::String], "[0, 0, 0, 0]");
const ROI_OFFSET: FieldDef = FieldDef::new("roi_offset", &[FieldType::Xywh], "[0, 0, 0, 0]");
const INDEX: FieldDef = FieldDef::new("index", &[FieldType::Int], "0");
const ORDER_BY: FieldDef = FieldDef::new("order_by", &[FieldType::String], r#""Horizontal""#);
const GREEN_MASK: FieldDef = FieldDef::new("green_mask", &[FieldType::Bool], "false");

const TEMPLATE: FieldDef =
    FieldDef::new("template", &[FieldType::StringList, FieldType::String], r#"[""]"#).required();
const TEMPLATE_THRESHOLD: FieldDef = FieldDef::new(
    "threshold",
    &[FieldType::DoubleList, FieldType::Double],
    "[0.7]",
);
const TEMPLATE_METHOD: FieldDef = FieldDef::new("method", &[FieldType::Int], "5");

const FEATURE_COUNT: FieldDef = FieldDef::new("count", &[FieldType::Int], "4");
const DETECTOR: FieldDef = FieldDef::new("detector", &[FieldType::String], r#""SIFT""#);
const RATIO: FieldDef = FieldDef::new("ratio", &[FieldType::Double], "0.6");

const COLOR_METHOD: FieldDef = FieldDef::new("method", &[FieldType::Int], "4");
const LOWER: FieldDef = FieldDef::new(
    "lower",
    &[FieldType::IntListList, FieldType::IntList],
    "[[0, 0, 0]]",
)
.required();
const UPPER: FieldDef = FieldDef::new(
    "upper",
    &[FieldType::IntListList, FieldType::IntList],
    "[[255, 255, 255]]",
)
.required();
const COLOR_COUNT: FieldDef = FieldDef::new("count", &[FieldType::Int], "1");
const CONNECTED: FieldDef = FieldDef::new("connected", &[FieldType::Bool], "false");

const OCR_EXPECTED: FieldDef =
    FieldDef::new("expected", &[FieldType::StringList, FieldType::String], r#"[""]"#).required();
const OCR_THRESHOLD: FieldDef = FieldDef::new("threshold", &[FieldType::Double], "0.3");
const REPLACE: FieldDef = FieldDef::new(
    "replace",
    &[FieldType::StringPairList, FieldType::StringPair],
    r#"[["origin", "target"]]"#,
);
const ONLY_REC: FieldDef = FieldDef::new("only_rec", &[FieldType::Bool], "false");
const OCR_MODEL: FieldDef = FieldDef::new("model", &[FieldType::String], r#""""#);

const LABELS: FieldDef =
    FieldDef::new("labels", &[FieldType::StringList, FieldType::String], r#"[""]"#);
const NN_MODEL: FieldDef = FieldDef::new("model", &[FieldType::String], r#""""#).required();
const NN_EXPECTED: FieldDef =
    FieldDef::new("expected", &[FieldType::IntList, FieldType::Int], "[0]").required();
const NN_THRESHOLD: FieldDef = FieldDef::new("threshold", &[FieldType::Double], "0.3");

const ALL_OF: FieldDef = FieldDef::new("all_of", &[FieldType::ObjectList], "[{}, {}]").required();
const ANY_OF: FieldDef = FieldDef::new("any_of", &[FieldType::ObjectList], "[{}, {}]").required();
const BOX_INDEX: FieldDef = FieldDef::new("box_index", &[FieldType::Int], "0");
const SUB_NAME: FieldDef = FieldDef::new("sub_name", &[FieldType::String], r#""""#);

const CUSTOM_RECOGNITION: FieldDef =
    FieldDef::new("custom_recognition", &[FieldType::String], r#""""#).required();
const CUSTOM_RECOGNITION_PARAM: FieldDef =
    FieldDef::new("custom_recognition_param", &[FieldType::Any], "{}");

/// Recognition algorithm of a pipeline node.
///
/// Parsing ignores ASCII case, so `"ocr"` and `"templatematch"` resolve to
/// their canonical spellings.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumIter, EnumString, IntoStaticStr)]
#[strum(ascii_case_insensitive)]
pub enum RecognitionType {
    /// Matches immediately without inspecting the screen.
    #[default]
    DirectHit,
    TemplateMatch,
    FeatureMatch,
    ColorMatch,
    #[strum(serialize = "OCR")]
    #[serde(rename = "OCR")]
    Ocr,
    NeuralNetworkClassify,
    NeuralNetworkDetect,
    /// Every sub-recognition must hit.
    And,
    /// Any sub-recognition may hit.
    Or,
    Custom,
}

impl RecognitionType {
    /// Type assumed when a document does not name one.
    pub const NOOP: Self = Self::DirectHit;

    /// Parses a type name, ignoring ASCII case.
    pub fn normalize(name: &str) -> Result<Self, SchemaError> {
        Self::from_str(name.trim())
            .map_err(|_| SchemaError::UnknownRecognitionType(name.to_owned()))
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
            Self::DirectHit => &[],
            Self::TemplateMatch => &[
                ROI,
                ROI_OFFSET,
                TEMPLATE,
                TEMPLATE_THRESHOLD,
                ORDER_BY,
                INDEX,
                TEMPLATE_METHOD,
                GREEN_MASK,
            ],
            Self::FeatureMatch => &[
                ROI,
                ROI_OFFSET,
                TEMPLATE,
                FEATURE_COUNT,
                ORDER_BY,
                INDEX,
                GREEN_MASK,
                DETECTOR,
                RATIO,
            ],
            Self::ColorMatch => &[
                ROI,
                ROI_OFFSET,
                COLOR_METHOD,
                LOWER,
                UPPER,
                COLOR_COUNT,
                ORDER_BY,
                INDEX,
                CONNECTED,
            ],
            Self::Ocr => &[
                ROI,
                ROI_OFFSET,
                OCR_EXPECTED,
                OCR_THRESHOLD,
                REPLACE,
                ORDER_BY,
                INDEX,
                ONLY_REC,
                OCR_MODEL,
            ],
            Self::NeuralNetworkClassify => &[
                ROI,
                ROI_OFFSET,
                LABELS,
                NN_MODEL,
                NN_EXPECTED,
                ORDER_BY,
                INDEX,
            ],
            Self::NeuralNetworkDetect => &[
                ROI,
                ROI_OFFSET,
                LABELS,
                NN_MODEL,
                NN_EXPECTED,
                NN_THRESHOLD,
                ORDER_BY,
                INDEX,
            ],
            Self::And => &[ALL_OF, BOX_INDEX, SUB_NAME],
            Self::Or => &[ANY_OF, SUB_NAME],
            Self::Custom => &[
                ROI,
                ROI_OFFSET,
                CUSTOM_RECOGNITION,
                CUSTOM_RECOGNITION_PARAM,
            ],
        }
    }

    /// Returns every parameter key declared by any recognition type.
    ///
    /// Used to classify flat keys of legacy documents.
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

    /// Returns whether `key` is a recognition parameter of any type.
    pub fn is_param_key(key: &str) -> bool {
        Self::param_keys().contains(&key)
    }
}
