use serde::Deserialize;
use std::fmt;

/// Spatial smoothing applied to the bin array once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum FilterMode {
    /// Groups of `range` bins take the group mean
    Block,
    /// Moving average over `range` neighbours on each side
    #[serde(rename = "box")]
    #[value(name = "box")]
    BoxFilter,
    /// Box filter run twice
    #[serde(rename = "double-box")]
    #[value(name = "double-box")]
    DoubleBoxFilter,
    /// Moving average with triangular weights
    #[serde(rename = "weighted")]
    #[value(name = "weighted")]
    WeightedFilter,
    /// Forward + backward exponential smoothing driven by `alpha`
    #[serde(rename = "exponential")]
    #[value(name = "exponential")]
    ExponentialFilter,
}

impl FilterMode {
    pub const ALL: [FilterMode; 5] = [
        FilterMode::Block,
        FilterMode::BoxFilter,
        FilterMode::DoubleBoxFilter,
        FilterMode::WeightedFilter,
        FilterMode::ExponentialFilter,
    ];

    /// 1-based position, the numbering used by the control commands.
    pub fn number(self) -> usize {
        Self::ALL.iter().position(|&m| m == self).unwrap_or(0) + 1
    }

    pub fn from_number(n: usize) -> Option<Self> {
        n.checked_sub(1).and_then(|i| Self::ALL.get(i).copied())
    }

    pub fn next(self) -> Self {
        Self::ALL[self.number() % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let len = Self::ALL.len();
        Self::ALL[(self.number() + len - 2) % len]
    }

    /// Accepts a mode name or its 1-based number.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if let Ok(n) = text.parse::<usize>() {
            return Self::from_number(n);
        }
        match text.to_ascii_lowercase().as_str() {
            "block" => Some(FilterMode::Block),
            "box" => Some(FilterMode::BoxFilter),
            "double-box" | "doublebox" => Some(FilterMode::DoubleBoxFilter),
            "weighted" => Some(FilterMode::WeightedFilter),
            "exponential" | "exp" => Some(FilterMode::ExponentialFilter),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FilterMode::Block => "block filter",
            FilterMode::BoxFilter => "box filter",
            FilterMode::DoubleBoxFilter => "double box filter",
            FilterMode::WeightedFilter => "weighted filter",
            FilterMode::ExponentialFilter => "exponential filter",
        }
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// User-tunable knobs, read at the start of every tick.
///
/// `decay` and `alpha` are stored exactly as entered; the accessors clamp
/// them where they are used.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub amp_scalar: u32,
    /// Percentage of the previous amplitude kept per tick when falling
    pub decay: i32,
    pub mode: FilterMode,
    /// Block size, or box/weighted half-width
    pub range: u32,
    pub alpha: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            amp_scalar: 5000,
            decay: 80,
            mode: FilterMode::DoubleBoxFilter,
            range: 8,
            alpha: 0.2,
        }
    }
}

impl PipelineConfig {
    /// Multiplier applied to a falling bin, `decay` clamped to 0..=100.
    pub fn decay_factor(&self) -> f32 {
        self.decay.clamp(0, 100) as f32 / 100.0
    }

    /// `alpha` clamped to (0, 1]; anything non-finite disables smoothing.
    pub fn effective_alpha(&self) -> f32 {
        if self.alpha.is_finite() {
            self.alpha.clamp(f32::EPSILON, 1.0)
        } else {
            1.0
        }
    }

    pub fn apply(&mut self, command: SettingsCommand) {
        match command {
            SettingsCommand::AmpScalar(v) => self.amp_scalar = v,
            SettingsCommand::Decay(v) => self.decay = v,
            SettingsCommand::Range(v) => self.range = v,
            SettingsCommand::Alpha(v) => self.alpha = v,
            SettingsCommand::Mode(m) => self.mode = m,
            SettingsCommand::NextMode => self.mode = self.mode.next(),
            SettingsCommand::PrevMode => self.mode = self.mode.prev(),
        }
        log::debug!("settings changed by {:?}: {:?}", command, self);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SettingsCommand {
    AmpScalar(u32),
    Decay(i32),
    Range(u32),
    Alpha(f32),
    Mode(FilterMode),
    NextMode,
    PrevMode,
}

/// Integer from user text. Empty, non-numeric, trailing garbage or out of
/// `i32` range all read as 0.
pub fn int_or_zero(text: &str) -> i32 {
    text.trim().parse::<i32>().unwrap_or(0)
}

/// Like [`int_or_zero`], negative values also read as 0.
pub fn unsigned_or_zero(text: &str) -> u32 {
    u32::try_from(int_or_zero(text)).unwrap_or(0)
}

pub fn float_or_zero(text: &str) -> f32 {
    text.trim().parse::<f32>().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_cycles_with_wraparound() {
        assert_eq!(FilterMode::Block.next(), FilterMode::BoxFilter);
        assert_eq!(FilterMode::ExponentialFilter.next(), FilterMode::Block);
        assert_eq!(FilterMode::Block.prev(), FilterMode::ExponentialFilter);
        assert_eq!(FilterMode::WeightedFilter.prev(), FilterMode::DoubleBoxFilter);
        for mode in FilterMode::ALL {
            assert_eq!(mode.next().prev(), mode);
        }
    }

    #[test]
    fn mode_parses_names_and_numbers() {
        assert_eq!(FilterMode::parse("box"), Some(FilterMode::BoxFilter));
        assert_eq!(FilterMode::parse(" Double-Box "), Some(FilterMode::DoubleBoxFilter));
        assert_eq!(FilterMode::parse("5"), Some(FilterMode::ExponentialFilter));
        assert_eq!(FilterMode::parse("1"), Some(FilterMode::Block));
        assert_eq!(FilterMode::parse("0"), None);
        assert_eq!(FilterMode::parse("6"), None);
        assert_eq!(FilterMode::parse("median"), None);
    }

    #[test]
    fn mode_deserializes_from_config_names() {
        #[derive(Deserialize)]
        struct Wrapper {
            mode: FilterMode,
        }
        let w: Wrapper = toml::from_str("mode = \"weighted\"").unwrap();
        assert_eq!(w.mode, FilterMode::WeightedFilter);
        let w: Wrapper = toml::from_str("mode = \"double-box\"").unwrap();
        assert_eq!(w.mode, FilterMode::DoubleBoxFilter);
    }

    #[test]
    fn decay_is_clamped_at_use() {
        let mut config = PipelineConfig::default();
        assert!((config.decay_factor() - 0.8).abs() < 1e-6);
        config.decay = 250;
        assert_eq!(config.decay_factor(), 1.0);
        config.decay = -40;
        assert_eq!(config.decay_factor(), 0.0);
        assert_eq!(config.decay, -40);
    }

    #[test]
    fn alpha_is_clamped_at_use() {
        let mut config = PipelineConfig::default();
        assert!((config.effective_alpha() - 0.2).abs() < 1e-6);
        config.alpha = 3.0;
        assert_eq!(config.effective_alpha(), 1.0);
        config.alpha = 0.0;
        assert!(config.effective_alpha() > 0.0);
        config.alpha = f32::NAN;
        assert_eq!(config.effective_alpha(), 1.0);
    }

    #[test]
    fn lenient_parsing_falls_back_to_zero() {
        assert_eq!(int_or_zero("42"), 42);
        assert_eq!(int_or_zero(" 17 "), 17);
        assert_eq!(int_or_zero("-3"), -3);
        assert_eq!(int_or_zero(""), 0);
        assert_eq!(int_or_zero("12ab"), 0);
        assert_eq!(int_or_zero("99999999999"), 0);
        assert_eq!(unsigned_or_zero("-3"), 0);
        assert_eq!(unsigned_or_zero("5000"), 5000);
        assert_eq!(float_or_zero("0.35"), 0.35);
        assert_eq!(float_or_zero("abc"), 0.0);
    }

    #[test]
    fn commands_update_config() {
        let mut config = PipelineConfig::default();
        config.apply(SettingsCommand::Range(4));
        config.apply(SettingsCommand::Alpha(0.5));
        config.apply(SettingsCommand::NextMode);
        assert_eq!(config.range, 4);
        assert_eq!(config.alpha, 0.5);
        assert_eq!(config.mode, FilterMode::WeightedFilter);
        config.apply(SettingsCommand::Mode(FilterMode::Block));
        config.apply(SettingsCommand::PrevMode);
        assert_eq!(config.mode, FilterMode::ExponentialFilter);
    }
}
