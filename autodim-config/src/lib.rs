use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

/// 应用配置的根结构。缺省的键使用默认值，存在但非法的值一律报错。
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub dimensioning: DimensioningConfig,
    #[serde(default)]
    pub drawing: DrawingConfig,
}

impl AppConfig {
    /// 从显式路径加载配置并校验。
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// 自动发现配置文件：优先读取环境变量 `AUTODIM_CONFIG`，否则寻找 `./config/default.toml`。
    /// 若文件缺失，则返回默认配置。
    pub fn discover() -> Result<Self, ConfigError> {
        if let Some(path) = env::var_os("AUTODIM_CONFIG") {
            return Self::from_file(PathBuf::from(path));
        }

        let default_path = env::current_dir()
            .map(|dir| dir.join("config").join("default.toml"))
            .map_err(|source| ConfigError::Context {
                message: "获取当前工作目录失败".to_string(),
                source,
            })?;

        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }

    /// 检查数值范围。类型错误在反序列化阶段已经拦截。
    pub fn validate(&self) -> Result<(), ConfigError> {
        let dim = &self.dimensioning;
        non_negative("dimensioning.dimension_offset", dim.dimension_offset)?;
        non_negative("dimensioning.min_dimension_length", dim.min_dimension_length)?;
        if let Some(height) = dim.text_height {
            positive("dimensioning.text_height", height)?;
        }
        positive("dimensioning.geometric_tolerance", dim.geometric_tolerance)?;
        positive("dimensioning.connectivity_tolerance", dim.connectivity_tolerance)?;
        if dim.max_dimensions_per_view == 0 {
            return Err(ConfigError::invalid(
                "dimensioning.max_dimensions_per_view",
                "必须大于 0",
            ));
        }

        let ratio = self.drawing.margin_ratio;
        if !ratio.is_finite() || !(0.0..0.5).contains(&ratio) {
            return Err(ConfigError::invalid(
                "drawing.margin_ratio",
                format!("必须位于 [0, 0.5) 区间（当前值 {ratio}）"),
            ));
        }
        Ok(())
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(
            field,
            format!("必须是非负有限数（当前值 {value}）"),
        ))
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(
            field,
            format!("必须是正的有限数（当前值 {value}）"),
        ))
    }
}

/// 日志配置，支持设置默认等级。
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

/// 制图标准，仅用于选择标注样式预设。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
pub enum DraftingStandard {
    #[default]
    #[serde(rename = "ISO", alias = "iso")]
    Iso,
    #[serde(rename = "ANSI", alias = "ansi")]
    Ansi,
}

impl fmt::Display for DraftingStandard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DraftingStandard::Iso => f.write_str("ISO"),
            DraftingStandard::Ansi => f.write_str("ANSI"),
        }
    }
}

impl FromStr for DraftingStandard {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ISO" => Ok(Self::Iso),
            "ANSI" => Ok(Self::Ansi),
            other => Err(ConfigError::invalid(
                "dimensioning.standard",
                format!("未知的制图标准 {other}（可选 ISO、ANSI）"),
            )),
        }
    }
}

/// 标准图纸幅面。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaperSize {
    #[serde(alias = "a0")]
    A0,
    #[serde(alias = "a1")]
    A1,
    #[serde(alias = "a2")]
    A2,
    #[serde(alias = "a3")]
    A3,
    #[serde(alias = "a4")]
    A4,
    #[serde(alias = "a5")]
    A5,
}

impl PaperSize {
    pub const ALL: [PaperSize; 6] = [
        PaperSize::A0,
        PaperSize::A1,
        PaperSize::A2,
        PaperSize::A3,
        PaperSize::A4,
        PaperSize::A5,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PaperSize::A0 => "A0",
            PaperSize::A1 => "A1",
            PaperSize::A2 => "A2",
            PaperSize::A3 => "A3",
            PaperSize::A4 => "A4",
            PaperSize::A5 => "A5",
        }
    }
}

impl fmt::Display for PaperSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PaperSize {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|size| size.name() == wanted)
            .ok_or_else(|| {
                ConfigError::invalid("drawing.paper_size", format!("未知的图纸幅面 {s}"))
            })
    }
}

/// 自动标注参数。
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DimensioningConfig {
    #[serde(default)]
    pub standard: DraftingStandard,
    #[serde(default = "DimensioningConfig::default_offset")]
    pub dimension_offset: f64,
    /// 缺省时使用样式预设的字高。
    #[serde(default)]
    pub text_height: Option<f64>,
    #[serde(default = "DimensioningConfig::default_min_length")]
    pub min_dimension_length: f64,
    /// 仅作提示：超出时输出警告，不截断。
    #[serde(default = "DimensioningConfig::default_max_per_view")]
    pub max_dimensions_per_view: usize,
    #[serde(default = "default_true")]
    pub dimension_angles: bool,
    #[serde(default = "default_true")]
    pub dimension_radii: bool,
    #[serde(default = "default_true")]
    pub dimension_diameters: bool,
    #[serde(default)]
    pub merge_collinear_chains: bool,
    #[serde(default = "DimensioningConfig::default_geometric_tolerance")]
    pub geometric_tolerance: f64,
    #[serde(default = "DimensioningConfig::default_connectivity_tolerance")]
    pub connectivity_tolerance: f64,
}

impl DimensioningConfig {
    fn default_offset() -> f64 {
        15.0
    }

    fn default_min_length() -> f64 {
        5.0
    }

    fn default_max_per_view() -> usize {
        20
    }

    fn default_geometric_tolerance() -> f64 {
        1e-6
    }

    fn default_connectivity_tolerance() -> f64 {
        1e-3
    }
}

fn default_true() -> bool {
    true
}

impl Default for DimensioningConfig {
    fn default() -> Self {
        Self {
            standard: DraftingStandard::default(),
            dimension_offset: Self::default_offset(),
            text_height: None,
            min_dimension_length: Self::default_min_length(),
            max_dimensions_per_view: Self::default_max_per_view(),
            dimension_angles: true,
            dimension_radii: true,
            dimension_diameters: true,
            merge_collinear_chains: false,
            geometric_tolerance: Self::default_geometric_tolerance(),
            connectivity_tolerance: Self::default_connectivity_tolerance(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DrawingConfig {
    #[serde(default)]
    pub paper_size: Option<PaperSize>,
    #[serde(default = "DrawingConfig::default_margin_ratio")]
    pub margin_ratio: f64,
    #[serde(default = "default_true")]
    pub normalize_origin: bool,
}

impl DrawingConfig {
    fn default_margin_ratio() -> f64 {
        0.1
    }
}

impl Default for DrawingConfig {
    fn default() -> Self {
        Self {
            paper_size: None,
            margin_ratio: Self::default_margin_ratio(),
            normalize_origin: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件 {path:?} 失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("解析配置文件 {path:?} 失败: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("配置项 {field} 非法: {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error("{message}")]
    Context {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
