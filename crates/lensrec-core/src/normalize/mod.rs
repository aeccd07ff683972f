//! Lens-term normalizer.
//!
//! Handles:
//! - Alias expansion (poly→polycarbonate, PAL→progressive, AR→anti-reflective)
//! - Typo absorption via fuzzy matching against the canonical vocabulary
//! - Configuration canonicalization before corpus lookups and catalog matching

use std::collections::HashMap;

use strsim::{jaro_winkler, normalized_levenshtein};

use crate::models::LensConfiguration;

/// Minimum fuzzy similarity for an unknown term to snap to a canonical one.
const FUZZY_THRESHOLD: f64 = 0.85;

/// Canonical lens types.
pub const CANONICAL_TYPES: &[&str] = &[
    "single-vision",
    "progressive",
    "bifocal",
    "trifocal",
    "office",
    "reading",
];

/// Canonical lens materials.
pub const CANONICAL_MATERIALS: &[&str] =
    &["cr-39", "polycarbonate", "trivex", "high-index", "glass"];

/// Canonical coatings.
pub const CANONICAL_COATINGS: &[&str] = &[
    "anti-reflective",
    "blue-light",
    "photochromic",
    "scratch-resistant",
    "hard-coat",
    "uv",
    "mirror",
    "polarized",
    "none",
];

/// Normalizer for lens type, material and coating terms.
pub struct LensTermNormalizer {
    /// Alias map: catalog spelling → canonical type
    type_aliases: HashMap<String, String>,
    /// Alias map: catalog spelling → canonical material
    material_aliases: HashMap<String, String>,
    /// Alias map: catalog spelling → canonical coating
    coating_aliases: HashMap<String, String>,
}

impl Default for LensTermNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl LensTermNormalizer {
    /// Create a normalizer with the default alias mappings.
    pub fn new() -> Self {
        Self {
            type_aliases: Self::default_type_aliases(),
            material_aliases: Self::default_material_aliases(),
            coating_aliases: Self::default_coating_aliases(),
        }
    }

    /// Canonicalize a lens type term.
    pub fn canonical_type(&self, raw: &str) -> String {
        canonicalize(raw, &self.type_aliases, CANONICAL_TYPES)
    }

    /// Canonicalize a material term.
    pub fn canonical_material(&self, raw: &str) -> String {
        canonicalize(raw, &self.material_aliases, CANONICAL_MATERIALS)
    }

    /// Canonicalize a coating term.
    pub fn canonical_coating(&self, raw: &str) -> String {
        canonicalize(raw, &self.coating_aliases, CANONICAL_COATINGS)
    }

    /// Canonicalize a full configuration, preserving its wrap angle.
    pub fn canonical_configuration(&self, cfg: &LensConfiguration) -> LensConfiguration {
        LensConfiguration {
            lens_type: self.canonical_type(&cfg.lens_type),
            material: self.canonical_material(&cfg.material),
            coating: self.canonical_coating(&cfg.coating),
            wrap_angle: cfg.wrap_angle,
        }
    }

    /// Add a custom type alias.
    pub fn add_type_alias(&mut self, alias: &str, canonical: &str) {
        self.type_aliases
            .insert(alias.to_lowercase(), canonical.to_lowercase());
    }

    /// Default lens type aliases.
    fn default_type_aliases() -> HashMap<String, String> {
        let mut map = HashMap::new();

        map.insert("sv".into(), "single-vision".into());
        map.insert("single vision".into(), "single-vision".into());
        map.insert("singlevision".into(), "single-vision".into());
        map.insert("distance only".into(), "single-vision".into());

        map.insert("progressives".into(), "progressive".into());
        map.insert("pal".into(), "progressive".into());
        map.insert("pals".into(), "progressive".into());
        map.insert("varifocal".into(), "progressive".into());
        map.insert("varifocals".into(), "progressive".into());
        map.insert("no-line bifocal".into(), "progressive".into());

        map.insert("bifocals".into(), "bifocal".into());
        map.insert("ft-28".into(), "bifocal".into());
        map.insert("ft-35".into(), "bifocal".into());
        map.insert("flat-top".into(), "bifocal".into());
        map.insert("executive".into(), "bifocal".into());

        map.insert("trifocals".into(), "trifocal".into());

        map.insert("computer lens".into(), "office".into());
        map.insert("office lens".into(), "office".into());
        map.insert("occupational".into(), "office".into());

        map.insert("readers".into(), "reading".into());
        map.insert("reading glasses".into(), "reading".into());

        map
    }

    /// Default material aliases.
    fn default_material_aliases() -> HashMap<String, String> {
        let mut map = HashMap::new();

        map.insert("poly".into(), "polycarbonate".into());
        map.insert("polycarb".into(), "polycarbonate".into());
        map.insert("1.59".into(), "polycarbonate".into());

        map.insert("plastic".into(), "cr-39".into());
        map.insert("standard plastic".into(), "cr-39".into());
        map.insert("cr39".into(), "cr-39".into());
        map.insert("1.50".into(), "cr-39".into());

        map.insert("hi-index".into(), "high-index".into());
        map.insert("high index".into(), "high-index".into());
        map.insert("1.60".into(), "high-index".into());
        map.insert("1.67".into(), "high-index".into());
        map.insert("1.74".into(), "high-index".into());

        map.insert("mineral".into(), "glass".into());

        map
    }

    /// Default coating aliases.
    fn default_coating_aliases() -> HashMap<String, String> {
        let mut map = HashMap::new();

        map.insert("ar".into(), "anti-reflective".into());
        map.insert("a/r".into(), "anti-reflective".into());
        map.insert("anti reflective".into(), "anti-reflective".into());
        map.insert("antireflective".into(), "anti-reflective".into());
        map.insert("anti-glare".into(), "anti-reflective".into());
        map.insert("anti glare".into(), "anti-reflective".into());
        map.insert("ar coat".into(), "anti-reflective".into());

        map.insert("blue light".into(), "blue-light".into());
        map.insert("bluelight".into(), "blue-light".into());
        map.insert("blue light filter".into(), "blue-light".into());
        map.insert("blue-light filter".into(), "blue-light".into());
        map.insert("blue filter".into(), "blue-light".into());

        map.insert("transitions".into(), "photochromic".into());
        map.insert("photochromatic".into(), "photochromic".into());
        map.insert("light-adaptive".into(), "photochromic".into());

        map.insert("scratch coat".into(), "scratch-resistant".into());
        map.insert("scratch resistant".into(), "scratch-resistant".into());
        map.insert("hard coat".into(), "hard-coat".into());
        map.insert("hardcoat".into(), "hard-coat".into());

        map.insert("uv protection".into(), "uv".into());
        map.insert("uv400".into(), "uv".into());

        map.insert("uncoated".into(), "none".into());
        map.insert("no coating".into(), "none".into());
        map.insert("".into(), "none".into());

        map
    }
}

/// Canonicalize a single term: alias hit, exact canonical, fuzzy snap, passthrough.
fn canonicalize(raw: &str, aliases: &HashMap<String, String>, vocabulary: &[&str]) -> String {
    let lower = raw.trim().to_lowercase();

    if let Some(canonical) = aliases.get(&lower) {
        return canonical.clone();
    }
    if vocabulary.contains(&lower.as_str()) {
        return lower;
    }

    // Typo absorption: snap to the best canonical term when clearly close.
    let mut best: Option<(&str, f64)> = None;
    for candidate in vocabulary {
        let similarity = fuzzy_match(&lower, candidate);
        if similarity >= FUZZY_THRESHOLD {
            match best {
                Some((_, score)) if score >= similarity => {}
                _ => best = Some((candidate, similarity)),
            }
        }
    }
    match best {
        Some((canonical, _)) => canonical.to_string(),
        None => lower,
    }
}

/// Compute fuzzy string similarity using combined metrics.
fn fuzzy_match(a: &str, b: &str) -> f64 {
    // Jaro-Winkler is better for prefix-heavy catalog spellings; Levenshtein
    // guards against short accidental prefixes.
    let jw = jaro_winkler(a, b);
    let lev = normalized_levenshtein(a, b);
    jw * 0.6 + lev * 0.4
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_aliases() {
        let normalizer = LensTermNormalizer::new();
        assert_eq!(normalizer.canonical_type("PAL"), "progressive");
        assert_eq!(normalizer.canonical_type("Progressives"), "progressive");
        assert_eq!(normalizer.canonical_type("single vision"), "single-vision");
        assert_eq!(normalizer.canonical_type("FT-28"), "bifocal");
    }

    #[test]
    fn test_material_aliases() {
        let normalizer = LensTermNormalizer::new();
        assert_eq!(normalizer.canonical_material("poly"), "polycarbonate");
        assert_eq!(normalizer.canonical_material("1.67"), "high-index");
        assert_eq!(normalizer.canonical_material("Plastic"), "cr-39");
    }

    #[test]
    fn test_coating_aliases() {
        let normalizer = LensTermNormalizer::new();
        assert_eq!(normalizer.canonical_coating("AR"), "anti-reflective");
        assert_eq!(normalizer.canonical_coating("anti-glare"), "anti-reflective");
        assert_eq!(normalizer.canonical_coating("Transitions"), "photochromic");
        assert_eq!(normalizer.canonical_coating(""), "none");
    }

    #[test]
    fn test_fuzzy_typo_snaps_to_canonical() {
        let normalizer = LensTermNormalizer::new();
        assert_eq!(normalizer.canonical_type("progresive"), "progressive");
        assert_eq!(normalizer.canonical_material("polycarbonte"), "polycarbonate");
    }

    #[test]
    fn test_unknown_term_passes_through() {
        let normalizer = LensTermNormalizer::new();
        assert_eq!(normalizer.canonical_type("aspheric wrap 8-base"), "aspheric wrap 8-base");
    }

    #[test]
    fn test_canonical_configuration_preserves_wrap() {
        let normalizer = LensTermNormalizer::new();
        let mut cfg = LensConfiguration::new("PALs", "poly", "AR");
        cfg.wrap_angle = Some(5.0);
        let canonical = normalizer.canonical_configuration(&cfg);
        assert_eq!(canonical.key(), "progressive|polycarbonate|anti-reflective");
        assert_eq!(canonical.wrap_angle, Some(5.0));
    }

    #[test]
    fn test_fuzzy_match_metric() {
        assert!(fuzzy_match("progressive", "progressive") > 0.99);
        assert!(fuzzy_match("progressive", "progresive") > 0.9);
        assert!(fuzzy_match("progressive", "bifocal") < 0.6);
    }
}
