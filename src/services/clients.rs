use super::blank_to_none;
use crate::{
    db::DbPool,
    entities::client::{self, Entity as ClientEntity, Model as ClientModel},
    errors::ServiceError,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, QueryOrder, Set};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateClientRequest {
    #[validate(length(min = 1, max = 255, message = "Client name is required"))]
    pub name: String,
    #[validate(length(max = 255))]
    pub contact_person: Option<String>,
    #[validate(length(min = 1, max = 50, message = "Client phone is required"))]
    pub phone: String,
    #[validate(email)]
    pub email: Option<String>,
    pub address: Option<String>,
}

/// Inserts a client on any connection, so document creation can add one
/// inside its own transaction.
pub(crate) async fn insert_client<C>(
    db: &C,
    request: CreateClientRequest,
) -> Result<ClientModel, ServiceError>
where
    C: ConnectionTrait,
{
    request.validate()?;
    let model = client::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(request.name.trim().to_string()),
        contact_person: Set(blank_to_none(request.contact_person)),
        phone: Set(request.phone.trim().to_string()),
        email: Set(blank_to_none(request.email)),
        address: Set(blank_to_none(request.address)),
        created_at: Set(Utc::now()),
    };
    Ok(model.insert(db).await?)
}

#[derive(Clone)]
pub struct ClientService {
    db_pool: Arc<DbPool>,
}

impl ClientService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self, request))]
    pub async fn create(&self, request: CreateClientRequest) -> Result<ClientModel, ServiceError> {
        let client = insert_client(&*self.db_pool, request).await?;
        info!(client_id = %client.id, "Client created");
        Ok(client)
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<ClientModel>, ServiceError> {
        Ok(ClientEntity::find()
            .order_by_asc(client::Column::Name)
            .all(&*self.db_pool)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, client_id: Uuid) -> Result<ClientModel, ServiceError> {
        ClientEntity::find_by_id(client_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Client {} not found", client_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_is_required() {
        let request = CreateClientRequest {
            name: "Ministry of Works".into(),
            contact_person: None,
            phone: String::new(),
            email: None,
            address: None,
        };
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("phone"));
    }
}
