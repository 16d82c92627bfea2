// 帧率实现
//
// 本模块把视频帧率建模为精确的有理数（分子/分母）加丢帧标志，
// 并提供比较、单帧时长、N帧时长以及时长到帧数的换算。
//
// # 换算规则
//
// - 时长换算沿用双精度浮点"先乘后除再截断"的结果，保证与下游时间码运算逐位一致
// - 帧数换算先用 i128 整数运算估算，再按浮点时长校正，是时长换算的反函数

use std::cmp::Ordering;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::error::{Result, TimecodeError};

/// 每秒纳秒数
const NANOS_PER_SEC: i64 = 1_000_000_000;

/// 帧率
///
/// 分子/分母按原样保存，不做约分。比较与相等都通过交叉相乘进行，
/// 因此 `50/2` 与 `25/1` 相等，但两者各自保留自己的分子分母和丢帧标志。
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "RateRepr", into = "RateRepr")]
pub struct Rate {
    num: i64,
    den: i64,
    drop_frame: bool,
}

/// 帧率的序列化形式
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct RateRepr {
    num: i64,
    den: i64,
    #[serde(default)]
    drop_frame: bool,
}

impl TryFrom<RateRepr> for Rate {
    type Error = TimecodeError;

    fn try_from(repr: RateRepr) -> Result<Self> {
        Rate::with_drop_frame(repr.num, repr.den, repr.drop_frame)
    }
}

impl From<Rate> for RateRepr {
    fn from(rate: Rate) -> Self {
        Self {
            num: rate.num,
            den: rate.den,
            drop_frame: rate.drop_frame,
        }
    }
}

impl Rate {
    /// 未定义帧率（0/1），仅作为调用方的哨兵值
    pub const UNDEFINED: Rate = Rate::from_parts(0, 1, false);

    pub const ONE_FPS: Rate = Rate::from_parts(1, 1, false);
    pub const RATE_23_976: Rate = Rate::from_parts(24_000, 1001, false);
    pub const RATE_24: Rate = Rate::from_parts(24, 1, false);
    pub const RATE_25: Rate = Rate::from_parts(25, 1, false);
    pub const RATE_29_97: Rate = Rate::from_parts(30_000, 1001, false);
    /// 29.97 DF
    pub const RATE_30_DF: Rate = Rate::from_parts(30_000, 1001, true);
    pub const RATE_30: Rate = Rate::from_parts(30, 1, false);
    pub const RATE_47_952: Rate = Rate::from_parts(48_000, 1001, false);
    pub const RATE_48: Rate = Rate::from_parts(48, 1, false);
    pub const RATE_50: Rate = Rate::from_parts(50, 1, false);
    pub const RATE_59_94: Rate = Rate::from_parts(60_000, 1001, false);
    /// 59.94 DF
    pub const RATE_60_DF: Rate = Rate::from_parts(60_000, 1001, true);
    pub const RATE_60: Rate = Rate::from_parts(60, 1, false);
    pub const RATE_96: Rate = Rate::from_parts(96, 1, false);
    pub const RATE_100: Rate = Rate::from_parts(100, 1, false);
    pub const RATE_120: Rate = Rate::from_parts(120, 1, false);

    const fn from_parts(num: i64, den: i64, drop_frame: bool) -> Self {
        Self {
            num,
            den,
            drop_frame,
        }
    }

    /// 创建非丢帧帧率
    ///
    /// # 参数
    ///
    /// * `num` - 分子
    /// * `den` - 分母
    ///
    /// # 错误
    ///
    /// 分母 <= 0、分子 < 0，或单帧时长超出 `i64` 纳秒范围时
    /// 返回 `TimecodeError::InvalidRate`
    ///
    /// # 示例
    ///
    /// ```
    /// use timecode::Rate;
    ///
    /// let rate = Rate::new(30_000, 1001).unwrap();
    /// assert_eq!(rate.rational_string(), "30000/1001");
    /// ```
    pub fn new(num: i64, den: i64) -> Result<Self> {
        Self::with_drop_frame(num, den, false)
    }

    /// 创建带丢帧标志的帧率
    pub fn with_drop_frame(num: i64, den: i64, drop_frame: bool) -> Result<Self> {
        if den <= 0 || num < 0 {
            debug!("Rejecting rate {}/{} (drop_frame={})", num, den, drop_frame);
            return Err(TimecodeError::InvalidRate { num, den });
        }

        // 单帧时长必须能用 i64 纳秒表示
        if num > 0 && den as i128 * NANOS_PER_SEC as i128 > i64::MAX as i128 * num as i128 {
            debug!(
                "Rejecting rate {}/{}: frame duration exceeds {} ns",
                num,
                den,
                i64::MAX
            );
            return Err(TimecodeError::InvalidRate { num, den });
        }

        Ok(Self::from_parts(num, den, drop_frame))
    }

    /// 按名称查找帧率表，如 `"25"`、`"29.97 DF"`
    pub fn lookup(name: &str) -> Option<Self> {
        RATE_CATALOG
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, rate)| *rate)
    }

    /// 按名称查找帧率表，找不到时返回 `TimecodeError::UnknownRate`
    pub fn from_name(name: &str) -> Result<Self> {
        Self::lookup(name).ok_or_else(|| {
            warn!("Rate '{}' is not in the catalog", name);
            TimecodeError::UnknownRate(name.to_string())
        })
    }

    /// 全部具名帧率，按表中顺序
    pub fn catalog() -> &'static [(&'static str, Rate)] {
        RATE_CATALOG
    }

    pub fn num(&self) -> i64 {
        self.num
    }

    pub fn den(&self) -> i64 {
        self.den
    }

    /// 原样返回 (分子, 分母)
    pub fn fraction(&self) -> (i64, i64) {
        (self.num, self.den)
    }

    pub fn is_drop_frame(&self) -> bool {
        self.drop_frame
    }

    /// 分子为 0 的未定义帧率返回 false
    pub fn is_valid(&self) -> bool {
        self.num > 0 && self.den > 0
    }

    /// 浮点帧率（帧/秒），仅用于显示
    pub fn as_f64(&self) -> f64 {
        self.num as f64 / self.den as f64
    }

    /// 时间码每秒的名义帧数（向上取整）
    ///
    /// 30000/1001 返回 30，24000/1001 返回 24。
    pub fn nominal_fps(&self) -> i64 {
        if !self.is_valid() {
            return 0;
        }
        self.num / self.den + i64::from(self.num % self.den != 0)
    }

    /// 丢帧时间码每分钟（逢十分钟除外）跳过的帧号数
    ///
    /// 29.97 DF 为 2，59.94 DF 为 4，非丢帧帧率为 0。
    pub fn dropped_frames_per_minute(&self) -> i64 {
        if !self.drop_frame {
            return 0;
        }
        self.nominal_fps() / 15
    }

    /// 交叉相乘判断相等，不要求约分
    pub fn is_equal(&self, other: &Rate) -> bool {
        self.compare(other) == Ordering::Equal
    }

    pub fn is_less(&self, other: &Rate) -> bool {
        self.compare(other) == Ordering::Less
    }

    /// 交叉相乘比较：`a.num * b.den` 对 `b.num * a.den`
    pub fn compare(&self, other: &Rate) -> Ordering {
        let lhs = self.num as i128 * other.den as i128;
        let rhs = other.num as i128 * self.den as i128;
        lhs.cmp(&rhs)
    }

    /// 返回较小的帧率，相等时返回 `other`
    pub fn min_rate(self, other: Rate) -> Rate {
        if self.is_less(&other) {
            self
        } else {
            other
        }
    }

    /// 返回较大的帧率，相等时返回 `self`
    pub fn max_rate(self, other: Rate) -> Rate {
        if self.is_less(&other) {
            other
        } else {
            self
        }
    }

    /// `"num/den"` 形式，不约分，不带丢帧后缀
    pub fn rational_string(&self) -> String {
        format!("{}/{}", self.num, self.den)
    }

    /// 单帧时长
    ///
    /// 按 `den * 1e9 / num` 的双精度结果向零截断到纳秒。
    /// 构造时已保证结果不超过 `i64::MAX` 纳秒。
    pub fn frame_duration(&self) -> Duration {
        if !self.is_valid() {
            return Duration::ZERO;
        }
        let nanos = self.den as f64 * NANOS_PER_SEC as f64 / self.num as f64;
        Duration::from_nanos(nanos as u64)
    }

    /// `frames` 帧对应的时长
    ///
    /// 直接按 `frames * 1e9 * den / num` 计算后截断，
    /// 而不是 `frames * frame_duration()`，避免逐帧截断误差累积。
    ///
    /// # 错误
    ///
    /// `frames` 为负数，或结果超出 `Duration` 的纳秒范围（`u64`）时
    /// 返回 `TimecodeError::InvalidArgument`
    pub fn duration(&self, frames: i64) -> Result<Duration> {
        if frames < 0 {
            return Err(TimecodeError::InvalidArgument(format!(
                "negative frame count {} for rate {}",
                frames,
                self.rational_string()
            )));
        }
        if !self.is_valid() {
            return Ok(Duration::ZERO);
        }

        let nanos = self.duration_nanos(frames).ok_or_else(|| {
            TimecodeError::InvalidArgument(format!(
                "duration of {} frames at rate {} exceeds {} ns",
                frames,
                self.rational_string(),
                u64::MAX
            ))
        })?;
        trace!("Duration of {} frames at {}: {} ns", frames, self, nanos);
        Ok(Duration::from_nanos(nanos))
    }

    /// `frames * 1e9 * den / num` 的双精度结果向零截断，超出 `u64` 时返回 None
    fn duration_nanos(&self, frames: i64) -> Option<u64> {
        let nanos = frames as f64 * NANOS_PER_SEC as f64 * self.den as f64 / self.num as f64;
        // u64::MAX as f64 为 2^64
        if !nanos.is_finite() || nanos >= u64::MAX as f64 {
            return None;
        }
        Some(nanos as u64)
    }

    /// `duration(frames) <= d`，溢出视为大于 d
    fn fits_within(&self, frames: i64, nanos: u64) -> bool {
        self.duration_nanos(frames).is_some_and(|n| n <= nanos)
    }

    /// 时长内完整容纳的帧数
    ///
    /// 返回满足 `duration(f) <= d` 的最大 `f`，因此 `frames(duration(f)) == f`。
    ///
    /// 先按精确有理数 `((d_ns + 1) * num - 1) / (den * 1e9)` 估算，
    /// 再在估算值附近按 `duration` 的浮点结果二分校正：帧数较大时
    /// 浮点乘积超过 2^53，截断结果可能比精确边界少 1ns。
    pub fn frames(&self, d: Duration) -> i64 {
        if !self.is_valid() {
            return 0;
        }

        let nanos = u64::try_from(d.as_nanos()).unwrap_or(u64::MAX);
        let denom = self.den as i128 * NANOS_PER_SEC as i128;
        let estimate = (nanos as i128 + 1)
            .checked_mul(self.num as i128)
            .map(|numer| (numer - 1) / denom)
            .and_then(|f| i64::try_from(f).ok())
            .unwrap_or(i64::MAX);

        // 浮点误差远小于估算值的 2^-40
        let slack = (estimate >> 40) + 2;
        let mut lo = estimate.saturating_sub(slack).max(0);
        if !self.fits_within(lo, nanos) {
            lo = 0;
        }
        let mut hi = estimate.saturating_add(slack);
        if self.fits_within(hi, nanos) {
            hi = i64::MAX;
            if self.fits_within(hi, nanos) {
                return i64::MAX;
            }
        }

        // 不变式：fits_within(lo) 为真，fits_within(hi) 为假
        while hi - lo > 1 {
            let mid = lo + (hi - lo) / 2;
            if self.fits_within(mid, nanos) {
                lo = mid;
            } else {
                hi = mid;
            }
        }

        if lo != estimate {
            trace!(
                "Corrected frame count at {} for {} ns: {} -> {}",
                self,
                nanos,
                estimate,
                lo
            );
        }
        lo
    }
}

/// 返回较小的帧率，相等时返回 `b`
pub fn min_rate(a: Rate, b: Rate) -> Rate {
    a.min_rate(b)
}

/// 返回较大的帧率，相等时返回 `a`
pub fn max_rate(a: Rate, b: Rate) -> Rate {
    a.max_rate(b)
}

static RATE_CATALOG: &[(&str, Rate)] = &[
    ("1", Rate::ONE_FPS),
    ("23.976", Rate::RATE_23_976),
    ("24", Rate::RATE_24),
    ("25", Rate::RATE_25),
    ("29.97", Rate::RATE_29_97),
    ("29.97 DF", Rate::RATE_30_DF),
    ("30", Rate::RATE_30),
    ("47.952", Rate::RATE_47_952),
    ("48", Rate::RATE_48),
    ("50", Rate::RATE_50),
    ("59.94", Rate::RATE_59_94),
    ("59.94 DF", Rate::RATE_60_DF),
    ("60", Rate::RATE_60),
    ("96", Rate::RATE_96),
    ("100", Rate::RATE_100),
    ("120", Rate::RATE_120),
];

impl Default for Rate {
    fn default() -> Self {
        Rate::RATE_25
    }
}

impl PartialEq for Rate {
    fn eq(&self, other: &Self) -> bool {
        self.is_equal(other)
    }
}

impl Eq for Rate {}

impl PartialOrd for Rate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Rate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}
