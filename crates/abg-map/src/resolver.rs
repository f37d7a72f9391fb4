//! Best-match selection over a fixed candidate list.

use abg_model::{CanonicalColumn, TestOutcome};

use crate::score::similarity;

/// Scores at or below this value are rejected.
pub const DEFAULT_THRESHOLD: u8 = 80;

/// A closed set of values, each with a reference label.
pub trait CanonicalLabel: Copy + 'static {
    /// Candidates in tie-break order.
    fn candidates() -> &'static [Self];
    fn label(self) -> &'static str;
}

impl CanonicalLabel for CanonicalColumn {
    fn candidates() -> &'static [Self] {
        &CanonicalColumn::ALL
    }

    fn label(self) -> &'static str {
        CanonicalColumn::label(self)
    }
}

impl CanonicalLabel for TestOutcome {
    fn candidates() -> &'static [Self] {
        &TestOutcome::ALL
    }

    fn label(self) -> &'static str {
        TestOutcome::label(self)
    }
}

/// A candidate together with its score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scored<T> {
    pub value: T,
    pub score: u8,
}

/// Maps free text onto canonical columns and outcomes.
#[derive(Debug, Clone, Copy)]
pub struct LabelResolver {
    threshold: u8,
}

impl Default for LabelResolver {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl LabelResolver {
    pub fn new(threshold: u8) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Highest-scoring candidate for `raw`, if it beats the threshold.
    ///
    /// On equal scores the candidate listed first wins.
    pub fn best_match<T: CanonicalLabel>(&self, raw: &str) -> Option<Scored<T>> {
        let mut best: Option<Scored<T>> = None;
        for &candidate in T::candidates() {
            let score = similarity(raw, candidate.label());
            if best.is_none_or(|current| score > current.score) {
                best = Some(Scored {
                    value: candidate,
                    score,
                });
            }
        }
        best.filter(|scored| scored.score > self.threshold)
    }

    pub fn resolve_column(&self, header: &str) -> Option<CanonicalColumn> {
        let resolved = self.best_match::<CanonicalColumn>(header);
        if resolved.is_none() && !header.trim().is_empty() {
            tracing::debug!(header, "header did not match any column");
        }
        resolved.map(|scored| scored.value)
    }

    pub fn classify_result(&self, value: &str) -> Option<TestOutcome> {
        self.best_match::<TestOutcome>(value)
            .map(|scored| scored.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_exact_and_misspelled_headers() {
        let resolver = LabelResolver::default();
        assert_eq!(
            resolver.resolve_column("BARKOD NO"),
            Some(CanonicalColumn::SpecimenId)
        );
        assert_eq!(
            resolver.resolve_column("antibiyotik adi"),
            Some(CanonicalColumn::AntibioticName)
        );
        assert_eq!(
            resolver.resolve_column("organizma  adı"),
            Some(CanonicalColumn::Organism)
        );
        assert_eq!(resolver.resolve_column("notes"), None);
    }

    #[test]
    fn classifies_results() {
        let resolver = LabelResolver::default();
        assert_eq!(
            resolver.classify_result("Dirençli"),
            Some(TestOutcome::Resistant)
        );
        assert_eq!(
            resolver.classify_result("duyarli"),
            Some(TestOutcome::Susceptible)
        );
        assert_eq!(
            resolver.classify_result("Yüksek Dozda Duyarlı"),
            Some(TestOutcome::SusceptibleAtHighDose)
        );
        assert_eq!(resolver.classify_result("çalışılmadı"), None);
        assert_eq!(resolver.classify_result(""), None);
    }

    #[test]
    fn threshold_is_exclusive() {
        // 2 * 14 / (16 + 19) = 0.80
        let at_threshold = "hasta adi soyaxxxxx";
        // 2 * 15 / (16 + 21) = 0.81
        let above_threshold = "hasta adi soyadxxxxxx";

        let resolver = LabelResolver::default();
        assert_eq!(similarity(at_threshold, "hasta adi soyadi"), 80);
        assert_eq!(similarity(above_threshold, "hasta adi soyadi"), 81);
        assert_eq!(resolver.resolve_column(at_threshold), None);
        assert_eq!(
            resolver.resolve_column(above_threshold),
            Some(CanonicalColumn::PatientName)
        );
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Twin {
        First,
        Second,
    }

    impl CanonicalLabel for Twin {
        fn candidates() -> &'static [Self] {
            &[Twin::First, Twin::Second]
        }

        fn label(self) -> &'static str {
            "sonuç şablon"
        }
    }

    #[test]
    fn equal_scores_go_to_the_first_candidate() {
        let resolver = LabelResolver::default();
        let exact = resolver.best_match::<Twin>("Sonuç Şablon").unwrap();
        assert_eq!(exact, Scored { value: Twin::First, score: 100 });

        let close = resolver.best_match::<Twin>("sonuc sablon").unwrap();
        assert_eq!(close.value, Twin::First);
        assert_eq!(close.score, similarity("sonuc sablon", "sonuç şablon"));
    }

    #[test]
    fn custom_threshold_is_respected() {
        let strict = LabelResolver::new(99);
        assert_eq!(strict.resolve_column("barkod noo"), None);
        assert_eq!(
            strict.resolve_column("barkod no"),
            Some(CanonicalColumn::SpecimenId)
        );
    }
}
