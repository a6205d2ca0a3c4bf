use crate::foundation::error::{EaselError, EaselResult};

/// A 256-entry channel remapping table.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct LookupTable([u8; 256]);

impl std::fmt::Debug for LookupTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("LookupTable")
            .field(&&self.0[..8])
            .finish_non_exhaustive()
    }
}

impl Default for LookupTable {
    fn default() -> Self {
        Self::identity()
    }
}

impl LookupTable {
    pub fn identity() -> Self {
        Self(std::array::from_fn(|i| i as u8))
    }

    pub fn from_array(values: [u8; 256]) -> Self {
        Self(values)
    }

    /// Build a table from a real-valued law over the sample index 0..=255.
    ///
    /// Results truncate toward zero and clamp to 0..=255; NaN maps to 0.
    pub fn from_fn(law: impl Fn(u8) -> f64) -> Self {
        Self(std::array::from_fn(|i| {
            let v = law(i as u8);
            if v.is_nan() {
                0
            } else {
                v.trunc().clamp(0.0, 255.0) as u8
            }
        }))
    }

    #[inline]
    pub fn get(&self, sample: u8) -> u8 {
        self.0[usize::from(sample)]
    }

    pub fn as_array(&self) -> &[u8; 256] {
        &self.0
    }
}

/// Table generation hook: a pure function of the filter's configuration.
pub trait TableFilter {
    fn table(&self) -> LookupTable;

    /// Whether alpha is remapped along with color.
    fn alpha_participates(&self) -> bool {
        false
    }
}

/// Object-safe per-pixel filter over straight RGBA8 buffers.
pub trait ImageFilter {
    fn filter(&mut self, rgba: &mut [u8]) -> EaselResult<()>;

    fn is_active(&self) -> bool {
        true
    }
}

/// Applies the lookup table of a [`TableFilter`] to RGBA8 buffers.
///
/// The table is built on first use and cached until the configuration changes
/// through [`TableImageFilter::set_config`] or [`TableImageFilter::update`].
#[derive(Debug, Clone)]
pub struct TableImageFilter<F> {
    config: F,
    cache: Option<LookupTable>,
    builds: u64,
    active: bool,
}

impl<F: TableFilter> TableImageFilter<F> {
    pub fn new(config: F) -> Self {
        Self {
            config,
            cache: None,
            builds: 0,
            active: true,
        }
    }

    pub fn config(&self) -> &F {
        &self.config
    }

    pub fn set_config(&mut self, config: F) {
        self.config = config;
        self.cache = None;
    }

    /// Mutate the configuration in place; the cached table is dropped.
    pub fn update(&mut self, f: impl FnOnce(&mut F)) {
        f(&mut self.config);
        self.cache = None;
    }

    /// Current table, rebuilt only if the configuration changed since the last call.
    pub fn table(&mut self) -> &LookupTable {
        let builds = &mut self.builds;
        let config = &self.config;
        self.cache.get_or_insert_with(|| {
            *builds += 1;
            tracing::debug!(builds = *builds, "build lookup table");
            config.table()
        })
    }

    /// How many times a table has been generated.
    pub fn table_builds(&self) -> u64 {
        self.builds
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Remap every pixel of a straight RGBA8 buffer in place.
    ///
    /// Alpha passes through unless the filter opts in. An empty buffer is a no-op,
    /// as is an inactive filter; a length that is not a multiple of 4 is rejected.
    #[tracing::instrument(level = "debug", skip_all, fields(len = rgba.len()))]
    pub fn apply(&mut self, rgba: &mut [u8]) -> EaselResult<()> {
        if !rgba.len().is_multiple_of(4) {
            return Err(EaselError::malformed_buffer(format!(
                "rgba8 buffer length {} is not a multiple of 4",
                rgba.len()
            )));
        }
        if !self.active || rgba.is_empty() {
            return Ok(());
        }
        let with_alpha = self.config.alpha_participates();
        let table = *self.table();
        for px in rgba.chunks_exact_mut(4) {
            let [r, g, b, a] = [px[0], px[1], px[2], px[3]];
            px[0] = table.get(r);
            px[1] = table.get(g);
            px[2] = table.get(b);
            if with_alpha {
                px[3] = table.get(a);
            }
        }
        Ok(())
    }
}

impl<F: TableFilter> ImageFilter for TableImageFilter<F> {
    fn filter(&mut self, rgba: &mut [u8]) -> EaselResult<()> {
        self.apply(rgba)
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

/// Ordered list of filters applied one after another.
#[derive(Default)]
pub struct FilterChain {
    filters: Vec<Box<dyn ImageFilter>>,
}

impl std::fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterChain")
            .field("len", &self.filters.len())
            .finish()
    }
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, filter: impl ImageFilter + 'static) -> &mut Self {
        self.filters.push(Box::new(filter));
        self
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn clear(&mut self) {
        self.filters.clear();
    }
}

impl ImageFilter for FilterChain {
    fn filter(&mut self, rgba: &mut [u8]) -> EaselResult<()> {
        if !rgba.len().is_multiple_of(4) {
            return Err(EaselError::malformed_buffer(format!(
                "rgba8 buffer length {} is not a multiple of 4",
                rgba.len()
            )));
        }
        for f in self.filters.iter_mut().filter(|f| f.is_active()) {
            f.filter(rgba)?;
        }
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.filters.iter().any(|f| f.is_active())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/filter/table.rs"]
mod tests;
