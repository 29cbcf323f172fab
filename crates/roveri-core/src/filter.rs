use std::collections::BTreeSet;

use crate::models::Pet;

const DOG_WORDS: &[&str] = &["dog", "cachorro", "cão", "cao", "canino", "canine"];
const CAT_WORDS: &[&str] = &["cat", "gato", "felino", "feline"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpeciesFilter {
    #[default]
    All,
    Dog,
    Cat,
}

impl SpeciesFilter {
    pub fn matches(&self, species: &str) -> bool {
        let species = species.to_lowercase();
        match self {
            SpeciesFilter::All => true,
            SpeciesFilter::Dog => DOG_WORDS.iter().any(|word| species.contains(word)),
            SpeciesFilter::Cat => CAT_WORDS.iter().any(|word| species.contains(word)),
        }
    }

    pub fn next(&self) -> Self {
        match self {
            SpeciesFilter::All => SpeciesFilter::Dog,
            SpeciesFilter::Dog => SpeciesFilter::Cat,
            SpeciesFilter::Cat => SpeciesFilter::All,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SpeciesFilter::All => "all",
            SpeciesFilter::Dog => "dogs",
            SpeciesFilter::Cat => "cats",
        }
    }
}

/// Client-side narrowing of the pet list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PetFilter {
    pub search: String,
    pub species: SpeciesFilter,
    pub city: Option<String>,
}

impl PetFilter {
    pub fn matches(&self, pet: &Pet) -> bool {
        let query = self.search.trim().to_lowercase();
        let matches_search = query.is_empty()
            || pet.name.to_lowercase().contains(&query)
            || pet.breed.to_lowercase().contains(&query);

        let matches_city = match &self.city {
            Some(city) => pet.city.trim() == city.trim(),
            None => true,
        };

        matches_search && self.species.matches(&pet.species) && matches_city
    }

    pub fn apply<'a>(&self, pets: &'a [Pet]) -> Vec<&'a Pet> {
        pets.iter().filter(|pet| self.matches(pet)).collect()
    }
}

/// Sorted, de-duplicated non-empty cities.
pub fn distinct_cities(pets: &[Pet]) -> Vec<String> {
    pets.iter()
        .map(|pet| pet.city.trim())
        .filter(|city| !city.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
