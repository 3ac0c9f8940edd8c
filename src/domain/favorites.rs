//! Favorite cities and coins.

use std::collections::BTreeMap;

use serde::Serialize;

/// Two independent favorite flags maps. An absent key counts as "not a
/// favorite", so the first toggle of an unknown key turns it on.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct Favorites {
    cities: BTreeMap<String, bool>,
    cryptos: BTreeMap<String, bool>,
}

impl Favorites {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip a city's flag and return the new value.
    pub fn toggle_city(&mut self, city: &str) -> bool {
        toggle(&mut self.cities, city)
    }

    /// Flip a coin's flag and return the new value.
    pub fn toggle_crypto(&mut self, id: &str) -> bool {
        toggle(&mut self.cryptos, id)
    }

    pub fn set_city(&mut self, city: &str, is_favorite: bool) {
        self.cities.insert(city.to_string(), is_favorite);
    }

    pub fn set_crypto(&mut self, id: &str, is_favorite: bool) {
        self.cryptos.insert(id.to_string(), is_favorite);
    }

    pub fn is_city_favorite(&self, city: &str) -> bool {
        self.cities.get(city).copied().unwrap_or(false)
    }

    pub fn is_crypto_favorite(&self, id: &str) -> bool {
        self.cryptos.get(id).copied().unwrap_or(false)
    }

    /// Favorite cities, sorted.
    pub fn favorite_cities(&self) -> Vec<String> {
        enabled(&self.cities)
    }

    /// Favorite coin ids, sorted.
    pub fn favorite_cryptos(&self) -> Vec<String> {
        enabled(&self.cryptos)
    }
}

fn toggle(map: &mut BTreeMap<String, bool>, key: &str) -> bool {
    let flag = map.entry(key.to_string()).or_insert(false);
    *flag = !*flag;
    *flag
}

fn enabled(map: &BTreeMap<String, bool>) -> Vec<String> {
    map.iter()
        .filter(|(_, on)| **on)
        .map(|(key, _)| key.clone())
        .collect()
}
