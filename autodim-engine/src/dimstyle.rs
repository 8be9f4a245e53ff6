//! 标注样式预设（ISO / ANSI）。
//!
//! 样式是静态数值，由放置请求按名称引用，引擎不做计算。

use autodim_config::DraftingStandard;
use serde::Serialize;

/// 标注文字相对尺寸线的竖直位置。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DimTextVertical {
    /// 文字位于尺寸线上方（ISO）
    Above,
    /// 文字压在尺寸线中间（ANSI）
    Centered,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimStyle {
    pub name: String,
    /// 文字高度（DIMTXT）
    pub text_height: f64,
    /// 箭头大小（DIMASZ）
    pub arrow_size: f64,
    /// 延伸线超出尺寸线的长度（DIMEXE）
    pub extension_line_extension: f64,
    /// 延伸线与定义点的间距（DIMEXO）
    pub extension_line_offset: f64,
    /// 文字周围留白（DIMGAP）
    pub text_gap: f64,
    pub text_vertical: DimTextVertical,
    /// 尺寸界线内文字保持水平（DIMTIH）
    pub text_inside_horizontal: bool,
    /// 尺寸界线外文字保持水平（DIMTOH）
    pub text_outside_horizontal: bool,
}

impl DimStyle {
    /// 覆盖字高，其余参数保持预设。
    pub fn with_text_height(mut self, text_height: f64) -> Self {
        self.text_height = text_height;
        self
    }
}

pub struct StandardDimStyles;

impl StandardDimStyles {
    pub const ISO_NAME: &'static str = "ISO_STANDARD";
    pub const ANSI_NAME: &'static str = "ANSI_STANDARD";

    pub fn iso() -> DimStyle {
        DimStyle {
            name: Self::ISO_NAME.to_string(),
            text_height: 2.5,
            arrow_size: 2.5,
            extension_line_extension: 1.25,
            extension_line_offset: 0.625,
            text_gap: 0.625,
            text_vertical: DimTextVertical::Above,
            text_inside_horizontal: false,
            text_outside_horizontal: false,
        }
    }

    pub fn ansi() -> DimStyle {
        DimStyle {
            name: Self::ANSI_NAME.to_string(),
            text_height: 3.0,
            arrow_size: 3.0,
            extension_line_extension: 1.5,
            extension_line_offset: 1.5,
            text_gap: 1.5,
            text_vertical: DimTextVertical::Centered,
            text_inside_horizontal: true,
            text_outside_horizontal: true,
        }
    }

    pub fn for_standard(standard: DraftingStandard) -> DimStyle {
        match standard {
            DraftingStandard::Iso => Self::iso(),
            DraftingStandard::Ansi => Self::ansi(),
        }
    }

    /// 按名称查找预设，供绘图端写出样式表时使用。
    pub fn by_name(name: &str) -> Option<DimStyle> {
        match name {
            Self::ISO_NAME => Some(Self::iso()),
            Self::ANSI_NAME => Some(Self::ansi()),
            _ => None,
        }
    }
}
