// 帧率配置
//
// 调用方在自己的配置文件（TOML/JSON）中声明帧率时使用的类型。

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::rate::Rate;

/// 配置中的帧率声明
///
/// 可以写帧率表中的名称，也可以写显式分数：
///
/// ```toml
/// rate = "29.97 DF"
/// # 或
/// rate = { num = 30000, den = 1001, drop_frame = true }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RateSetting {
    /// 帧率表名称
    Named(String),
    /// 显式分数
    Explicit(Rate),
}

impl RateSetting {
    /// 解析为帧率
    pub fn resolve(&self) -> Result<Rate> {
        let rate = match self {
            RateSetting::Named(name) => Rate::from_name(name)?,
            RateSetting::Explicit(rate) => *rate,
        };

        debug!(
            "Resolved rate setting {:?} -> {} (drop_frame={})",
            self,
            rate,
            rate.is_drop_frame()
        );
        Ok(rate)
    }
}

impl Default for RateSetting {
    fn default() -> Self {
        RateSetting::Explicit(Rate::default())
    }
}

impl From<Rate> for RateSetting {
    fn from(rate: Rate) -> Self {
        RateSetting::Explicit(rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TimecodeError;

    #[derive(Debug, Deserialize)]
    struct ProjectConfig {
        rate: RateSetting,
    }

    #[test]
    fn test_named_setting_from_toml() {
        let config: ProjectConfig = toml::from_str(r#"rate = "29.97 DF""#).unwrap();
        let rate = config.rate.resolve().unwrap();

        assert_eq!(rate.fraction(), (30_000, 1001));
        assert!(rate.is_drop_frame());
    }

    #[test]
    fn test_explicit_setting_from_toml() {
        let config: ProjectConfig =
            toml::from_str("rate = { num = 50, den = 2 }").unwrap();
        let rate = config.rate.resolve().unwrap();

        // 显式分数原样保留，不约分
        assert_eq!(rate.fraction(), (50, 2));
        assert!(!rate.is_drop_frame());
        assert_eq!(rate, Rate::RATE_25);
    }

    #[test]
    fn test_explicit_setting_rejects_invalid_rate() {
        let result: std::result::Result<ProjectConfig, _> =
            toml::from_str("rate = { num = 25, den = 0 }");
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_name() {
        let setting = RateSetting::Named("31 DF".to_string());
        assert_eq!(
            setting.resolve(),
            Err(TimecodeError::UnknownRate("31 DF".to_string()))
        );
    }

    #[test]
    fn test_setting_from_json() {
        let setting: RateSetting = serde_json::from_str(r#""59.94 DF""#).unwrap();
        assert_eq!(setting.resolve().unwrap().dropped_frames_per_minute(), 4);

        let setting: RateSetting =
            serde_json::from_str(r#"{"num":24000,"den":1001}"#).unwrap();
        assert_eq!(setting.resolve().unwrap().nominal_fps(), 24);
    }

    #[test]
    fn test_default_setting() {
        assert_eq!(RateSetting::default().resolve().unwrap().fraction(), (25, 1));
        assert_eq!(RateSetting::from(Rate::RATE_48).resolve().unwrap(), Rate::RATE_48);
    }
}
