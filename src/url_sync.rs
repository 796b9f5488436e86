// Address synchronization
// Reads filter selections out of the page address and writes them back with replace-navigation.

use tracing::debug;

use crate::filter::{Dimension, FilterState};
use crate::reference::IdentifierResolver;

// Ordered query parameters of the page address
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    // First value for `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    // Replaces an existing key in place or appends it
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut params = QueryParams::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

// Address surface of the hosting page
pub trait Navigator {
    fn current_params(&self) -> QueryParams;

    // Swap the query parameters without adding a history entry
    fn replace_params(&mut self, params: QueryParams);
}

// Stateless: the notification of our own replace-navigation reads back the state that was
// just written, so `read` reports no change and nothing is re-fetched.
#[derive(Debug, Default, Clone, Copy)]
pub struct UrlSynchronizer;

impl UrlSynchronizer {
    pub fn new() -> Self {
        Self
    }

    // Address form of the filter state: destination, type, duration, set dimensions only.
    // A duration still known only by its legacy id is written as that id.
    pub fn params_for(filter: &FilterState) -> QueryParams {
        let mut params = QueryParams::new();
        for dimension in Dimension::ALL {
            let selection = filter.selection(dimension);
            match (&selection.slug, selection.id) {
                (Some(slug), _) => params.insert(dimension.url_key(), slug.clone()),
                (None, Some(id)) if dimension == Dimension::Duration => {
                    params.insert(dimension.url_key(), id.to_string())
                }
                _ => {}
            }
        }
        params
    }

    pub fn read<R>(&self, filter: &mut FilterState, params: &QueryParams, resolver: &R) -> bool
    where
        R: IdentifierResolver + ?Sized,
    {
        filter.set_from_url(params, resolver)
    }

    // Writes the filter state to the address. Skips the navigation entirely when the address
    // already matches. Returns the parameters that are now current.
    pub fn write<N>(&self, filter: &FilterState, navigator: &mut N) -> QueryParams
    where
        N: Navigator + ?Sized,
    {
        let params = Self::params_for(filter);
        if navigator.current_params() == params {
            debug!("address already up to date");
            return params;
        }

        debug!(params = ?params, "replacing address parameters");
        navigator.replace_params(params.clone());
        params
    }
}

#[cfg(test)]
pub mod test_support {
    use super::*;

    // In-memory address that records every replace-navigation
    #[derive(Debug, Default)]
    pub struct MemoryNavigator {
        pub params: QueryParams,
        pub replace_count: usize,
    }

    impl MemoryNavigator {
        pub fn with_params(pairs: &[(&str, &str)]) -> Self {
            Self {
                params: pairs
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                ..Default::default()
            }
        }
    }

    impl Navigator for MemoryNavigator {
        fn current_params(&self) -> QueryParams {
            self.params.clone()
        }

        fn replace_params(&mut self, params: QueryParams) {
            self.replace_count += 1;
            self.params = params;
        }
    }
}
