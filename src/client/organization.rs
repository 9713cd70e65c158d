//! Companies, departments, positions and work locations: four resources with the
//! same CRUD shape, described once by [`Resource`].

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::client::{ApiClient, ClientResult};
use crate::models::{Company, Department, Position, WorkLocation};
use crate::pagination::Paginated;
use crate::routes::companies::{CompanyRequest, ListCompanies};
use crate::routes::departments::{DepartmentRequest, ListDepartments};
use crate::routes::positions::{ListPositions, PositionRequest};
use crate::routes::work_locations::{ListWorkLocations, WorkLocationRequest};

/// A CRUD collection at `path`: rows `T`, write body `B`, list filters `Q`.
pub struct Resource<T, B, Q> {
    path: &'static str,
    _types: PhantomData<fn() -> (T, B, Q)>,
}

impl<T, B, Q> Resource<T, B, Q>
where
    T: DeserializeOwned,
    B: Serialize,
    Q: Serialize,
{
    pub const fn new(path: &'static str) -> Self {
        Self {
            path,
            _types: PhantomData,
        }
    }

    pub fn path(&self) -> &'static str {
        self.path
    }

    pub async fn list(&self, client: &ApiClient, params: &Q) -> ClientResult<Paginated<T>> {
        client.get_page(self.path, params).await
    }

    pub async fn get(&self, client: &ApiClient, id: Uuid) -> ClientResult<T> {
        client.get(&format!("{}/{id}", self.path)).await
    }

    pub async fn create(&self, client: &ApiClient, body: &B) -> ClientResult<T> {
        client.post(self.path, body).await
    }

    pub async fn update(&self, client: &ApiClient, id: Uuid, body: &B) -> ClientResult<T> {
        client.put(&format!("{}/{id}", self.path), body).await
    }

    pub async fn delete(&self, client: &ApiClient, id: Uuid) -> ClientResult<()> {
        client.delete(&format!("{}/{id}", self.path)).await
    }
}

pub const COMPANIES: Resource<Company, CompanyRequest, ListCompanies> = Resource::new("/companies");
pub const DEPARTMENTS: Resource<Department, DepartmentRequest, ListDepartments> =
    Resource::new("/departments");
pub const POSITIONS: Resource<Position, PositionRequest, ListPositions> =
    Resource::new("/positions");
pub const WORK_LOCATIONS: Resource<WorkLocation, WorkLocationRequest, ListWorkLocations> =
    Resource::new("/work-locations");

/// Departments of one company, first page of up to 100.
pub async fn departments_of(client: &ApiClient, company_id: Uuid) -> ClientResult<Vec<Department>> {
    let params = ListDepartments {
        company_id: Some(company_id),
        per_page: Some(100),
        ..Default::default()
    };
    Ok(DEPARTMENTS.list(client, &params).await?.data)
}
