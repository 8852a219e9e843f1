//! The person controller: an in-memory registry behind `/person`.

use std::sync::Arc;

use rampart::prelude::*;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

/// A registered person.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Person {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct NewPerson {
    name: String,
    age: Option<u32>,
}

/// Shared storage for the controller.
#[derive(Debug, Clone, Default)]
pub struct PersonStore {
    people: Arc<RwLock<Vec<Person>>>,
}

impl PersonStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, name: String, age: Option<u32>) -> Person {
        let person = Person {
            id: Uuid::now_v7().to_string(),
            name,
            age,
        };
        self.people.write().await.push(person.clone());
        person
    }

    pub async fn list(&self) -> Vec<Person> {
        self.people.read().await.clone()
    }

    pub async fn get(&self, id: &str) -> Option<Person> {
        self.people.read().await.iter().find(|p| p.id == id).cloned()
    }
}

/// Handlers for `/person` and `/person/{id}`.
///
/// Both resources share the structural path `/person`, so one handler set
/// serves them. `GET` tells them apart by the presence of `id`.
pub fn controller(store: PersonStore) -> HandlerSet {
    let reader = store.clone();
    let writer = store;

    HandlerSet::new()
        .get(handler_fn(move |ctx: &mut RequestContext| {
            let store = reader.clone();
            Box::pin(async move {
                match ctx.param("id").map(ToString::to_string) {
                    Some(id) => {
                        let person = store
                            .get(&id)
                            .await
                            .ok_or_else(|| HandlerError::not_found(format!("person {id} not found")))?;
                        tracing::debug!(id = %id, subject = ?ctx.subject(), "Fetched person");
                        ctx.set_data_from(&person)
                    }
                    None => ctx.set_data_from(&store.list().await),
                }
            })
        }))
        .post(handler_fn(move |ctx: &mut RequestContext| {
            let store = writer.clone();
            Box::pin(async move {
                let new: NewPerson = ctx.json()?;
                let person = store.insert(new.name, new.age).await;
                tracing::info!(id = %person.id, "Created person");
                ctx.set_data_from(&person)
            })
        }))
}
