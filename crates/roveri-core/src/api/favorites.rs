use serde::Serialize;
use tracing::debug;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::models::{Listing, Pet};

pub const FAVORITES_PATH: &str = "favorites/";

pub fn favorite_path(pet_id: i64) -> String {
    format!("favorites/{pet_id}/")
}

#[derive(Serialize)]
struct AddFavoriteRequest {
    pet: i64,
}

impl ApiClient {
    /// The signed-in user's favorite pets.
    pub async fn list_favorites(&self) -> Result<Vec<Pet>, ApiError> {
        let favorites: Listing<Pet> = self.get_json(FAVORITES_PATH).await?;
        Ok(favorites.into_vec())
    }

    pub async fn add_favorite(&self, pet_id: i64) -> Result<(), ApiError> {
        let _: serde_json::Value = self
            .post_json(FAVORITES_PATH, &AddFavoriteRequest { pet: pet_id })
            .await?;
        Ok(())
    }

    pub async fn remove_favorite(&self, pet_id: i64) -> Result<(), ApiError> {
        self.delete(&favorite_path(pet_id)).await
    }

    /// Flip `pet` in `favorites` on the server, then locally on success.
    pub async fn toggle_favorite(&self, pet: &Pet, favorites: &mut Vec<Pet>) -> Result<bool, ApiError> {
        if favorites.iter().any(|fav| fav.id == pet.id) {
            self.remove_favorite(pet.id).await?;
            favorites.retain(|fav| fav.id != pet.id);
            debug!(pet_id = pet.id, "favorite removed");
            Ok(false)
        } else {
            self.add_favorite(pet.id).await?;
            favorites.push(pet.clone());
            debug!(pet_id = pet.id, "favorite added");
            Ok(true)
        }
    }
}
