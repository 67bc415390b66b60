//! Canonical trace set and its merge algorithm.

use super::archive::{build_archive, TraceArchive};
use super::policy::{find_old_data_gap, has_real_elsewhere, rank, same_parser, MergePolicy};
use crate::trace::{LoadedParser, SessionParsers, TimelineExt, TraceCategory, TraceFile, TraceParser};
use crate::utils::Diagnostic;
use log::{debug, info, warn};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

/// Holds at most one canonical parser per category and decides which
/// candidates of a new load replace, join or lose against the current set.
///
/// Legacy (per-file) and modern (per-session) parsers are kept apart: a
/// category present in the modern set always hides the legacy one, and
/// loading a new session discards the whole previous session.
#[derive(Default)]
pub struct MergeRegistry {
    policy: MergePolicy,
    legacy: BTreeMap<TraceCategory, LoadedParser>,
    modern: BTreeMap<TraceCategory, LoadedParser>,
}

impl MergeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: MergePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Merge a batch of candidates into the canonical set.
    ///
    /// Steps run in a fixed order: the new session replaces the old one,
    /// candidates hidden by the session are rejected,
    /// elapsed-only traces lose to real-clock ones, traces far older than
    /// the rest are dropped, screenshots lose to a screen recording, and
    /// finally the surviving legacy candidates compete per category.
    ///
    /// # Returns
    /// One diagnostic per discarded parser, in the order they were discarded
    pub fn merge(&mut self, new_legacy: Vec<LoadedParser>, new_modern: Option<SessionParsers>) -> Vec<Diagnostic> {
        debug!(
            "Merging {} legacy candidate(s){}",
            new_legacy.len(),
            if new_modern.is_some() { " and a session" } else { "" }
        );
        let mut diagnostics = Vec::new();

        if let Some(session) = new_modern {
            self.replace_session(session, &mut diagnostics);
        }
        let candidates = self.drop_hidden_by_session(new_legacy, &mut diagnostics);
        let candidates = self.drop_elapsed_only(candidates, &mut diagnostics);
        let candidates = self.drop_old_data(candidates, &mut diagnostics);
        let candidates = self.drop_screenshots_if_recorded(candidates, &mut diagnostics);
        self.add_legacy(candidates, &mut diagnostics);

        for diagnostic in &diagnostics {
            warn!("{}", diagnostic);
        }
        info!(
            "Canonical set now holds {} legacy and {} session parser(s)",
            self.legacy.len(),
            self.modern.len()
        );
        diagnostics
    }

    fn replace_session(&mut self, session: SessionParsers, diagnostics: &mut Vec<Diagnostic>) {
        let stale = std::mem::take(&mut self.modern);
        if !stale.is_empty() {
            info!("Discarding {} parser(s) of the previous session", stale.len());
        }

        let mut batch: BTreeMap<TraceCategory, LoadedParser> = BTreeMap::new();
        for parser in session.parsers {
            let category = parser.category();
            let candidate = LoadedParser::new(session.file.clone(), parser);

            if let Some(legacy) = self.legacy.remove(&category) {
                diagnostics.push(Diagnostic::overridden(legacy.source()));
            }

            let replaces = match batch.get(&category) {
                None => true,
                Some(current) => {
                    if rank(candidate.parser.as_ref()) > rank(current.parser.as_ref()) {
                        diagnostics.push(Diagnostic::overridden(current.source()));
                        true
                    } else {
                        diagnostics.push(Diagnostic::overridden(candidate.source()));
                        false
                    }
                }
            };
            if replaces {
                batch.insert(category, candidate);
            }
        }
        self.modern = batch;
    }

    /// Legacy candidates of a category the session already provides never
    /// become canonical, so they must not count as evidence either.
    fn drop_hidden_by_session(
        &self,
        candidates: Vec<LoadedParser>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<LoadedParser> {
        let (hidden, kept): (Vec<_>, Vec<_>) = candidates
            .into_iter()
            .partition(|c| self.modern.contains_key(&c.category()));
        for loaded in hidden {
            diagnostics.push(Diagnostic::overridden(loaded.source()));
        }
        kept
    }

    /// Every parser that could serve as evidence against a candidate
    fn evidence_pool(&self, candidates: &[LoadedParser]) -> Vec<Arc<dyn TraceParser>> {
        candidates
            .iter()
            .chain(self.legacy.values())
            .chain(self.modern.values())
            .map(|loaded| loaded.parser.clone())
            .collect()
    }

    /// Drop legacy parsers (new and canonical) carrying only elapsed
    /// timestamps when any other parser has real ones.
    fn drop_elapsed_only(&mut self, candidates: Vec<LoadedParser>, diagnostics: &mut Vec<Diagnostic>) -> Vec<LoadedParser> {
        let pool = self.evidence_pool(&candidates);
        let is_stale = |loaded: &LoadedParser| {
            loaded.parser.is_elapsed_only() && has_real_elsewhere(&loaded.parser, &pool)
        };

        let (kept, dropped): (Vec<_>, Vec<_>) = candidates.into_iter().partition(|c| !is_stale(c));
        let stale_canonical: Vec<TraceCategory> = self
            .legacy
            .iter()
            .filter(|(_, loaded)| is_stale(loaded))
            .map(|(category, _)| *category)
            .collect();

        for loaded in dropped {
            diagnostics.push(Diagnostic::old_data(loaded.file.descriptor(), None));
        }
        for category in stale_canonical {
            if let Some(loaded) = self.legacy.remove(&category) {
                diagnostics.push(Diagnostic::old_data(loaded.file.descriptor(), None));
            }
        }
        kept
    }

    /// Drop legacy parsers (new and canonical) that end long before some
    /// other parser starts.
    fn drop_old_data(&mut self, candidates: Vec<LoadedParser>, diagnostics: &mut Vec<Diagnostic>) -> Vec<LoadedParser> {
        let pool = self.evidence_pool(&candidates);
        let policy = self.policy;

        let mut kept = Vec::with_capacity(candidates.len());
        for loaded in candidates {
            match find_old_data_gap(&loaded.parser, &pool, &policy) {
                Some(gap) => diagnostics.push(Diagnostic::old_data(loaded.file.descriptor(), Some(gap))),
                None => kept.push(loaded),
            }
        }

        let stale_canonical: Vec<_> = self
            .legacy
            .iter()
            .filter_map(|(category, loaded)| {
                find_old_data_gap(&loaded.parser, &pool, &policy).map(|gap| (*category, gap))
            })
            .collect();
        for (category, gap) in stale_canonical {
            if let Some(loaded) = self.legacy.remove(&category) {
                diagnostics.push(Diagnostic::old_data(loaded.file.descriptor(), Some(gap)));
            }
        }
        kept
    }

    fn drop_screenshots_if_recorded(
        &mut self,
        candidates: Vec<LoadedParser>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<LoadedParser> {
        let recording = TraceCategory::ScreenRecording;
        let recorded = self.legacy.contains_key(&recording)
            || self.modern.contains_key(&recording)
            || candidates.iter().any(|c| c.category() == recording);
        if !recorded {
            return candidates;
        }

        let (screenshots, kept): (Vec<_>, Vec<_>) = candidates
            .into_iter()
            .partition(|c| c.category() == TraceCategory::Screenshot);
        let canonical = [
            self.legacy.remove(&TraceCategory::Screenshot),
            self.modern.remove(&TraceCategory::Screenshot),
        ];

        for loaded in screenshots.into_iter().chain(canonical.into_iter().flatten()) {
            diagnostics.push(Diagnostic::overridden_by(loaded.source(), recording));
        }
        kept
    }

    fn add_legacy(&mut self, candidates: Vec<LoadedParser>, diagnostics: &mut Vec<Diagnostic>) {
        let mut added_now: HashSet<TraceCategory> = HashSet::new();

        for candidate in candidates {
            let category = candidate.category();
            let accept = match self.legacy.get(&category) {
                None => true,
                // Several files of one category in the same load: keep the richer one
                Some(current) if added_now.contains(&category) => {
                    if rank(candidate.parser.as_ref()) > rank(current.parser.as_ref()) {
                        diagnostics.push(Diagnostic::overridden(current.source()));
                        true
                    } else {
                        diagnostics.push(Diagnostic::overridden(candidate.source()));
                        false
                    }
                }
                // Newer loads always replace earlier ones
                Some(current) => {
                    diagnostics.push(Diagnostic::overridden(current.source()));
                    true
                }
            };

            if accept {
                debug!("Loaded {} from {}", category, candidate.file.descriptor());
                self.legacy.insert(category, candidate);
            }
            added_now.insert(category);
        }
    }

    /// Canonical parsers ordered by category, legacy and session alike
    pub fn parsers(&self) -> Vec<Arc<dyn TraceParser>> {
        self.loaded().map(|loaded| loaded.parser.clone()).collect()
    }

    pub fn loaded(&self) -> impl Iterator<Item = &LoadedParser> {
        let mut all: Vec<&LoadedParser> = self.legacy.values().chain(self.modern.values()).collect();
        all.sort_by_key(|loaded| loaded.category());
        all.into_iter()
    }

    pub fn get(&self, category: TraceCategory) -> Option<&LoadedParser> {
        self.modern.get(&category).or_else(|| self.legacy.get(&category))
    }

    pub fn contains(&self, category: TraceCategory) -> bool {
        self.get(category).is_some()
    }

    pub fn len(&self) -> usize {
        self.legacy.len() + self.modern.len()
    }

    pub fn is_empty(&self) -> bool {
        self.legacy.is_empty() && self.modern.is_empty()
    }

    /// Remove the canonical parser of `category` from whichever set holds it
    pub fn remove(&mut self, category: TraceCategory) -> bool {
        let removed = self.legacy.remove(&category).is_some() | self.modern.remove(&category).is_some();
        if removed {
            debug!("Removed {}", category);
        }
        removed
    }

    pub fn clear(&mut self) {
        self.legacy.clear();
        self.modern.clear();
    }

    /// Largest real-to-elapsed offset over the candidates' offsets and the
    /// canonical set.
    ///
    /// Every load must convert elapsed timestamps with the same offset or the
    /// traces would not line up.
    pub fn latest_epoch_offset(&self, candidate_offsets: impl IntoIterator<Item = Option<i64>>) -> Option<i64> {
        candidate_offsets
            .into_iter()
            .flatten()
            .chain(self.loaded().filter_map(|loaded| loaded.parser.epoch_offset_ns()))
            .max()
    }

    /// Files backing the canonical set, laid out for download.
    ///
    /// The session file (if any) lands at the root; every legacy file goes
    /// into its category directory.
    pub fn export_archive(&self) -> TraceArchive {
        let session: Option<&TraceFile> = self.modern.values().next().map(|loaded| &loaded.file);
        build_archive(session, self.legacy.values())
    }

    /// Whether `parser` is one of the canonical parsers
    pub fn holds(&self, parser: &Arc<dyn TraceParser>) -> bool {
        self.loaded().any(|loaded| same_parser(&loaded.parser, parser))
    }
}

impl std::fmt::Debug for MergeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MergeRegistry")
            .field("policy", &self.policy)
            .field("legacy", &self.legacy.keys().collect::<Vec<_>>())
            .field("modern", &self.modern.keys().collect::<Vec<_>>())
            .finish()
    }
}
