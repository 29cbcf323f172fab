use std::path::Path;

use tracing::info;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::models::{Listing, NewPet, Pet, SiteStats};
use crate::transport::{FilePart, MultipartForm};

pub const PETS_PATH: &str = "pets/";
pub const STATS_PATH: &str = "stats/";

pub fn pet_path(id: i64) -> String {
    format!("pets/{id}/")
}

pub fn pets_by_owner_path(owner_id: i64) -> String {
    format!("pets/?owner={owner_id}")
}

impl ApiClient {
    /// Published pets only, in the backend's order (newest first).
    pub async fn list_pets(&self) -> Result<Vec<Pet>, ApiError> {
        let pets: Listing<Pet> = self.get_json(PETS_PATH).await?;
        Ok(pets
            .into_vec()
            .into_iter()
            .filter(|pet| pet.is_published)
            .collect())
    }

    /// Every listing the backend returns, hidden ones included. Used by the admin view.
    pub async fn list_all_pets(&self) -> Result<Vec<Pet>, ApiError> {
        let pets: Listing<Pet> = self.get_json(PETS_PATH).await?;
        Ok(pets.into_vec())
    }

    pub async fn list_pets_by_owner(&self, owner_id: i64) -> Result<Vec<Pet>, ApiError> {
        let pets: Listing<Pet> = self.get_json(&pets_by_owner_path(owner_id)).await?;
        Ok(pets.into_vec())
    }

    pub async fn get_pet(&self, id: i64) -> Result<Pet, ApiError> {
        self.get_json(&pet_path(id)).await
    }

    pub async fn create_pet(&self, pet: &NewPet) -> Result<Pet, ApiError> {
        if pet.name.trim().is_empty() {
            return Err(ApiError::InvalidInput("A pet needs a name".to_string()));
        }
        let file = match &pet.image {
            Some(path) => Some(read_image(path).await?),
            None => None,
        };
        let form = MultipartForm {
            fields: pet.text_fields(),
            file,
        };
        let created: Pet = self.post_multipart(PETS_PATH, form).await?;
        info!(pet_id = created.id, "pet published");
        Ok(created)
    }

    pub async fn delete_pet(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&pet_path(id)).await?;
        info!(pet_id = id, "pet deleted");
        Ok(())
    }

    pub async fn site_stats(&self) -> Result<SiteStats, ApiError> {
        self.get_json(STATS_PATH).await
    }
}

async fn read_image(path: &Path) -> Result<FilePart, ApiError> {
    let bytes = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "image".to_string());
    Ok(FilePart {
        field: "image".to_string(),
        file_name,
        bytes,
    })
}
