//! Locale resolution
//!
//! Built-in English and Spanish catalogs for every narrative string the
//! engine emits, an explicit `resolve(key, locale)` fallback chain, and the
//! [`Translate`] seam callers use to inject their own translations.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Supported narrative languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Es,
}

impl Locale {
    pub const DEFAULT: Locale = Locale::En;

    /// Parse a locale tag by its language subtag ("es-MX" → Spanish).
    /// Unsupported languages resolve to the default locale.
    pub fn parse(tag: &str) -> Self {
        let language = tag
            .trim()
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match language.as_str() {
            "es" => Self::Es,
            _ => Self::DEFAULT,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Es => "es",
        }
    }
}

/// String lookup supplied by the caller.
///
/// Implemented for any `Fn(&str) -> String`. Returning an empty string or the
/// key itself means "not translated" and triggers the catalog fallback.
pub trait Translate {
    fn translate(&self, key: &str) -> String;
}

impl<F> Translate for F
where
    F: Fn(&str) -> String,
{
    fn translate(&self, key: &str) -> String {
        self(key)
    }
}

/// Immutable per-locale string tables
#[derive(Debug, Clone)]
pub struct LocaleCatalog {
    tables: HashMap<Locale, HashMap<&'static str, &'static str>>,
}

impl Default for LocaleCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl LocaleCatalog {
    /// Catalog with the built-in English and Spanish tables
    pub fn new() -> Self {
        let mut tables = HashMap::new();
        tables.insert(Locale::En, EN.iter().copied().collect());
        tables.insert(Locale::Es, ES.iter().copied().collect());
        Self { tables }
    }

    /// Look up `key` in `locale`, then in the default locale
    pub fn resolve(&self, key: &str, locale: Locale) -> Option<&'static str> {
        [locale, Locale::DEFAULT]
            .iter()
            .find_map(|l| self.tables.get(l).and_then(|table| table.get(key)).copied())
    }

    /// A [`Translate`] bound to one locale of this catalog
    pub fn translator(&self, locale: Locale) -> CatalogTranslator<'_> {
        CatalogTranslator {
            catalog: self,
            locale,
        }
    }
}

/// Translator backed by a [`LocaleCatalog`]
#[derive(Debug, Clone, Copy)]
pub struct CatalogTranslator<'a> {
    catalog: &'a LocaleCatalog,
    locale: Locale,
}

impl Translate for CatalogTranslator<'_> {
    fn translate(&self, key: &str) -> String {
        self.catalog
            .resolve(key, self.locale)
            .map(str::to_string)
            .unwrap_or_default()
    }
}

/// Resolves keys through the caller's translator first, then the catalog
pub(crate) struct TextResolver<'a, T: ?Sized> {
    translate: &'a T,
    catalog: &'a LocaleCatalog,
    locale: Locale,
}

impl<'a, T: Translate + ?Sized> TextResolver<'a, T> {
    pub(crate) fn new(translate: &'a T, catalog: &'a LocaleCatalog, locale: Locale) -> Self {
        Self {
            translate,
            catalog,
            locale,
        }
    }

    /// Text for `key`; a key missing everywhere renders as itself
    pub(crate) fn text(&self, key: &str) -> String {
        let text = self.translate.translate(key);
        if !text.trim().is_empty() && text != key {
            return text;
        }
        self.catalog
            .resolve(key, self.locale)
            .map(str::to_string)
            .unwrap_or_else(|| key.to_string())
    }

    /// Text for `key` with `{name}` placeholders filled in
    pub(crate) fn render(&self, key: &str, params: &[(&str, String)]) -> String {
        interpolate(&self.text(key), params)
    }

    /// Text for `key` only if some source actually translates it
    pub(crate) fn lookup(&self, key: &str) -> Option<String> {
        let text = self.text(key);
        (text != key).then_some(text)
    }
}

/// Replace `{name}` placeholders with their values
pub fn interpolate(template: &str, params: &[(&str, String)]) -> String {
    params.iter().fold(template.to_string(), |text, (name, value)| {
        text.replace(&format!("{{{name}}}"), value)
    })
}

const EN: &[(&str, &str)] = &[
    // Weekly narratives
    ("insights.weekly.recovery.notice", "You found your way back this week."),
    ("insights.weekly.recovery.summary", "After a heavier moment, your next check-in landed somewhere lighter. That return is part of formation."),
    ("insights.weekly.steady_growth.notice", "Your rhythm is steady and your tone is lifting."),
    ("insights.weekly.steady_growth.summary", "You showed up on a regular cadence, and your check-ins leaned steadier than last week."),
    ("insights.weekly.rising_strain.notice", "This week has carried more weight."),
    ("insights.weekly.rising_strain.summary", "Your check-ins leaned heavier than last week. Be gentle with yourself and keep returning."),
    ("insights.weekly.high_variation.notice", "Your week moved through wide swings."),
    ("insights.weekly.high_variation.summary", "Your moods shifted sharply from one check-in to the next. Noticing that is already a practice."),
    ("insights.weekly.sunday_anchor.notice", "Sunday's teaching stayed with you."),
    ("insights.weekly.sunday_anchor.summary", "{count} reflections this week connected back to a teaching. Let it keep anchoring your days."),
    ("insights.weekly.dominant_mood.notice", "{mood} kept surfacing this week."),
    ("insights.weekly.dominant_mood.summary", "You named {mood} {count} times. Consider what has been shaping it."),
    ("insights.weekly.insufficient_data.notice", "Your week is just beginning to take shape."),
    ("insights.weekly.insufficient_data.summary", "A few more check-ins will help reveal your rhythm."),
    ("insights.weekly.taking_shape.notice", "A rhythm is taking shape."),
    ("insights.weekly.taking_shape.summary", "Keep checking in. Patterns grow clearer with each reflection."),
    ("insights.weekly.metrics", "Check-ins: {entries} · Active days: {days} · Last week: {previous_days}"),
    // Signal tags
    ("insights.signal.steady_cadence", "Steady cadence"),
    ("insights.signal.scattered_cadence", "Scattered cadence"),
    ("insights.signal.recovery_present", "Recovery"),
    ("insights.signal.high_variation", "Wide swings"),
    ("insights.signal.sunday_anchor", "Sunday anchor"),
    ("insights.signal.growing_steadiness", "Growing steadiness"),
    ("insights.signal.rising_strain", "Rising strain"),
    // Month comparison
    ("insights.monthly.more_consistent.title", "A more consistent month"),
    ("insights.monthly.more_consistent.body", "You checked in on {days} days this month, compared with {previous_days} by this point last month."),
    ("insights.monthly.steadier_tone.title", "A steadier tone"),
    ("insights.monthly.steadier_tone.body", "Your check-ins this month have leaned lighter than last month's."),
    ("insights.monthly.heavier_month.title", "A heavier month"),
    ("insights.monthly.heavier_month.body", "This month has asked more of you than last. Small returns still count."),
    ("insights.monthly.gradual_practice.title", "A gradual practice"),
    ("insights.monthly.gradual_practice.body", "Your rhythm is holding close to last month. Formation is slow, steady work."),
    ("insights.monthly.anchor.more", "You linked {count} reflections to a teaching this month, up from {previous}."),
    ("insights.monthly.anchor.fewer", "You linked {count} reflections to a teaching this month, down from {previous}."),
    ("insights.monthly.anchor.similar", "You linked {count} reflections to a teaching this month, about the same as last month."),
    // Mood labels
    ("mood.peaceful", "Peaceful"),
    ("mood.rushed", "Rushed"),
    ("mood.anxious", "Anxious"),
    ("mood.grateful", "Grateful"),
    ("mood.tired", "Tired"),
    ("mood.focused", "Focused"),
];

const ES: &[(&str, &str)] = &[
    ("insights.weekly.recovery.notice", "Esta semana encontraste el camino de regreso."),
    ("insights.weekly.recovery.summary", "Después de un momento más pesado, tu siguiente registro llegó a un lugar más ligero. Ese regreso es parte de la formación."),
    ("insights.weekly.steady_growth.notice", "Tu ritmo es constante y tu ánimo va en aumento."),
    ("insights.weekly.steady_growth.summary", "Te presentaste con regularidad, y tus registros se inclinaron hacia más estabilidad que la semana pasada."),
    ("insights.weekly.rising_strain.notice", "Esta semana ha pesado más."),
    ("insights.weekly.rising_strain.summary", "Tus registros se sintieron más pesados que la semana pasada. Sé amable contigo y sigue regresando."),
    ("insights.weekly.high_variation.notice", "Tu semana tuvo altibajos marcados."),
    ("insights.weekly.high_variation.summary", "Tu ánimo cambió mucho de un registro a otro. Notarlo ya es una práctica."),
    ("insights.weekly.sunday_anchor.notice", "La enseñanza del domingo te acompañó."),
    ("insights.weekly.sunday_anchor.summary", "{count} reflexiones de esta semana se conectaron con una enseñanza. Deja que siga anclando tus días."),
    ("insights.weekly.dominant_mood.notice", "{mood} apareció una y otra vez esta semana."),
    ("insights.weekly.dominant_mood.summary", "Nombraste {mood} {count} veces. Piensa en lo que lo ha ido formando."),
    ("insights.weekly.insufficient_data.notice", "Tu semana apenas comienza a tomar forma."),
    ("insights.weekly.insufficient_data.summary", "Algunos registros más ayudarán a revelar tu ritmo."),
    ("insights.weekly.taking_shape.notice", "Un ritmo está tomando forma."),
    ("insights.weekly.taking_shape.summary", "Sigue registrando. Los patrones se aclaran con cada reflexión."),
    ("insights.weekly.metrics", "Registros: {entries} · Días activos: {days} · Semana pasada: {previous_days}"),
    ("insights.signal.steady_cadence", "Ritmo constante"),
    ("insights.signal.scattered_cadence", "Ritmo disperso"),
    ("insights.signal.recovery_present", "Recuperación"),
    ("insights.signal.high_variation", "Altibajos"),
    ("insights.signal.sunday_anchor", "Ancla dominical"),
    ("insights.signal.growing_steadiness", "Estabilidad creciente"),
    ("insights.signal.rising_strain", "Tensión en aumento"),
    ("insights.monthly.more_consistent.title", "Un mes más constante"),
    ("insights.monthly.more_consistent.body", "Registraste {days} días este mes, frente a {previous_days} a estas alturas del mes pasado."),
    ("insights.monthly.steadier_tone.title", "Un tono más estable"),
    ("insights.monthly.steadier_tone.body", "Tus registros de este mes se han sentido más ligeros que los del mes pasado."),
    ("insights.monthly.heavier_month.title", "Un mes más pesado"),
    ("insights.monthly.heavier_month.body", "Este mes te ha exigido más que el anterior. Los pequeños regresos también cuentan."),
    ("insights.monthly.gradual_practice.title", "Una práctica gradual"),
    ("insights.monthly.gradual_practice.body", "Tu ritmo se mantiene cerca del mes pasado. La formación es un trabajo lento y constante."),
    ("insights.monthly.anchor.more", "Conectaste {count} reflexiones con una enseñanza este mes, más que las {previous} del mes pasado."),
    ("insights.monthly.anchor.fewer", "Conectaste {count} reflexiones con una enseñanza este mes, menos que las {previous} del mes pasado."),
    ("insights.monthly.anchor.similar", "Conectaste {count} reflexiones con una enseñanza este mes, casi igual que el mes pasado."),
    ("mood.peaceful", "En paz"),
    ("mood.rushed", "Apurado"),
    ("mood.anxious", "Ansioso"),
    ("mood.grateful", "Agradecido"),
    ("mood.tired", "Cansado"),
    ("mood.focused", "Enfocado"),
];
