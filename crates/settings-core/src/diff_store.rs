use std::{collections::BTreeMap, fmt, marker::PhantomData, sync::Arc};

use tracing::trace;

/// Closed set of field names shared by a form's baseline, edits and diff.
pub trait FormField: Copy + Ord + fmt::Debug + 'static {
    /// Every field of the record, in declaration order.
    const ALL: &'static [Self];

    /// Position of the field inside [`FormField::ALL`].
    fn index(self) -> usize;

    /// Wire/display name of the field.
    fn name(self) -> &'static str;
}

/// Pure function deriving one baseline value from the (possibly absent) source record.
pub type DefaultProducer<F, S, V> = fn(Option<&S>, F) -> V;

/// Fully resolved record: the user's override where touched, the baseline otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldValues<F, V = String> {
    values: Vec<V>,
    _fields: PhantomData<F>,
}

impl<F: FormField, V> FieldValues<F, V> {
    pub fn get(&self, field: F) -> &V {
        &self.values[field.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (F, &V)> {
        F::ALL.iter().copied().zip(self.values.iter())
    }
}

/// Edit-state diff tracker.
///
/// Keeps a baseline derived from an external source record plus a per-field
/// overlay of user edits. `diff()` reports only touched fields whose value
/// differs from the baseline, which is what a partial update should send.
///
/// The baseline is re-derived whenever the source changes identity (a
/// different `Arc`), and every re-derivation drops all edits.
pub struct DiffStore<F, S, V = String> {
    producer: DefaultProducer<F, S, V>,
    source: Option<Arc<S>>,
    baseline: Vec<V>,
    edits: Vec<Option<V>>,
}

impl<F, S, V> fmt::Debug for DiffStore<F, S, V>
where
    F: FormField,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiffStore")
            .field("has_source", &self.source.is_some())
            .field("baseline", &self.baseline)
            .field("edits", &self.edits)
            .finish()
    }
}

impl<F, S, V> DiffStore<F, S, V>
where
    F: FormField,
    V: Clone + PartialEq,
{
    /// Create a store with no source yet; the baseline is `producer(None, _)`.
    pub fn new(producer: DefaultProducer<F, S, V>) -> Self {
        Self::with_source(producer, None)
    }

    pub fn with_source(producer: DefaultProducer<F, S, V>, source: Option<Arc<S>>) -> Self {
        let mut store = Self {
            producer,
            source,
            baseline: Vec::with_capacity(F::ALL.len()),
            edits: Vec::with_capacity(F::ALL.len()),
        };
        store.rebase();
        store
    }

    /// Current source record, if any.
    pub fn source(&self) -> Option<&Arc<S>> {
        self.source.as_ref()
    }

    /// Point the store at `source`. Rebases only if the identity changed.
    ///
    /// Returns `true` when the baseline was re-derived (and edits dropped).
    pub fn sync_source(&mut self, source: Option<Arc<S>>) -> bool {
        let unchanged = match (&self.source, &source) {
            (Some(current), Some(next)) => Arc::ptr_eq(current, next),
            (None, None) => true,
            _ => false,
        };
        if unchanged {
            return false;
        }

        self.source = source;
        self.rebase();
        true
    }

    /// Re-derive the baseline from the current source and drop every edit.
    pub fn rebase(&mut self) {
        let source = self.source.as_deref();
        let producer = self.producer;
        self.baseline = F::ALL.iter().map(|field| producer(source, *field)).collect();
        self.edits = vec![None; F::ALL.len()];
        trace!(field_count = self.baseline.len(), "diff store rebased");
    }

    /// Mark `field` touched with `value`.
    pub fn set(&mut self, field: F, value: V) {
        self.edits[field.index()] = Some(value);
    }

    /// Write the baseline value back into `field` so it no longer differs.
    pub fn reset(&mut self, field: F) {
        let idx = field.index();
        self.edits[idx] = Some(self.baseline[idx].clone());
    }

    /// Current value of one field.
    pub fn get(&self, field: F) -> &V {
        let idx = field.index();
        self.edits[idx].as_ref().unwrap_or(&self.baseline[idx])
    }

    /// Baseline value of one field.
    pub fn baseline(&self, field: F) -> &V {
        &self.baseline[field.index()]
    }

    /// Whether `set`/`reset` was called for `field` since the last rebase.
    pub fn is_touched(&self, field: F) -> bool {
        self.edits[field.index()].is_some()
    }

    /// Whether `field` currently differs from its baseline.
    pub fn is_changed(&self, field: F) -> bool {
        let idx = field.index();
        self.edits[idx]
            .as_ref()
            .is_some_and(|value| *value != self.baseline[idx])
    }

    pub fn is_dirty(&self) -> bool {
        F::ALL.iter().any(|field| self.is_changed(*field))
    }

    pub fn values(&self) -> FieldValues<F, V> {
        FieldValues {
            values: F::ALL.iter().map(|field| self.get(*field).clone()).collect(),
            _fields: PhantomData,
        }
    }

    /// Touched fields whose value differs from the baseline.
    pub fn diff(&self) -> BTreeMap<F, V> {
        F::ALL
            .iter()
            .filter(|field| self.is_changed(**field))
            .filter_map(|field| {
                self.edits[field.index()]
                    .clone()
                    .map(|value| (*field, value))
            })
            .collect()
    }
}
