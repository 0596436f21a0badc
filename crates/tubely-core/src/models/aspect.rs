use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Pixel dimensions of the first video stream of a media file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoGeometry {
    pub width: u32,
    pub height: u32,
}

impl VideoGeometry {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Coarse orientation of a video, used only to choose the storage key prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AspectClass {
    /// Close to 16:9
    Wide,
    /// Close to 9:16
    Tall,
    Other,
}

impl AspectClass {
    /// Key prefix (without the trailing slash) for objects of this class.
    pub fn prefix(&self) -> &'static str {
        match self {
            AspectClass::Wide => "wide",
            AspectClass::Tall => "tall",
            AspectClass::Other => "other",
        }
    }
}

impl Display for AspectClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.prefix())
    }
}
