//! Payroll settings: TER bands, progressive brackets, PTKP statuses and the
//! tax simulation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::client::{ApiClient, ClientResult};
use crate::models::{PtkpStatus, TaxBracket, TerConfig};
use crate::routes::payroll::{
    BracketQuery, BracketRequest, PtkpRequest, SimulationRequest, TerQuery, TerRequest,
};
use crate::tax::TaxSimulation;

pub use crate::tax::{band_label, format_rate, format_rupiah};

/// Everything the settings screen shows, loaded together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayrollSettings {
    pub ter_configs: Vec<TerConfig>,
    pub tax_brackets: Vec<TaxBracket>,
    pub ptkp_statuses: Vec<PtkpStatus>,
}

/// Fetch the three settings lists concurrently; any failure fails the whole load.
pub async fn load_settings(client: &ApiClient) -> ClientResult<PayrollSettings> {
    let (ter_query, bracket_query) = (TerQuery::default(), BracketQuery::default());
    let (ter_configs, tax_brackets, ptkp_statuses) = tokio::try_join!(
        list_ter(client, &ter_query),
        list_brackets(client, &bracket_query),
        list_ptkp(client),
    )?;
    Ok(PayrollSettings {
        ter_configs,
        tax_brackets,
        ptkp_statuses,
    })
}

pub async fn list_ter(client: &ApiClient, params: &TerQuery) -> ClientResult<Vec<TerConfig>> {
    client.get_with("/payroll/ter-configs", params).await
}

pub async fn create_ter(client: &ApiClient, body: &TerRequest) -> ClientResult<TerConfig> {
    client.post("/payroll/ter-configs", body).await
}

pub async fn update_ter(
    client: &ApiClient,
    id: Uuid,
    body: &TerRequest,
) -> ClientResult<TerConfig> {
    client.put(&format!("/payroll/ter-configs/{id}"), body).await
}

pub async fn delete_ter(client: &ApiClient, id: Uuid) -> ClientResult<()> {
    client.delete(&format!("/payroll/ter-configs/{id}")).await
}

pub async fn list_brackets(
    client: &ApiClient,
    params: &BracketQuery,
) -> ClientResult<Vec<TaxBracket>> {
    client.get_with("/payroll/tax-brackets", params).await
}

pub async fn create_bracket(client: &ApiClient, body: &BracketRequest) -> ClientResult<TaxBracket> {
    client.post("/payroll/tax-brackets", body).await
}

pub async fn update_bracket(
    client: &ApiClient,
    id: Uuid,
    body: &BracketRequest,
) -> ClientResult<TaxBracket> {
    client.put(&format!("/payroll/tax-brackets/{id}"), body).await
}

pub async fn delete_bracket(client: &ApiClient, id: Uuid) -> ClientResult<()> {
    client.delete(&format!("/payroll/tax-brackets/{id}")).await
}

pub async fn list_ptkp(client: &ApiClient) -> ClientResult<Vec<PtkpStatus>> {
    client.get("/payroll/ptkp").await
}

pub async fn create_ptkp(client: &ApiClient, body: &PtkpRequest) -> ClientResult<PtkpStatus> {
    client.post("/payroll/ptkp", body).await
}

pub async fn update_ptkp(
    client: &ApiClient,
    id: Uuid,
    body: &PtkpRequest,
) -> ClientResult<PtkpStatus> {
    client.put(&format!("/payroll/ptkp/{id}"), body).await
}

pub async fn delete_ptkp(client: &ApiClient, id: Uuid) -> ClientResult<()> {
    client.delete(&format!("/payroll/ptkp/{id}")).await
}

pub async fn simulate(
    client: &ApiClient,
    monthly_gross: i64,
    ptkp_code: &str,
) -> ClientResult<TaxSimulation> {
    let body = SimulationRequest {
        monthly_gross,
        ptkp_code: ptkp_code.to_string(),
    };
    client.post("/payroll/tax-simulation", &body).await
}

/// `Rp 0 - Rp 60.000.000: 5%` style label for a bracket row.
pub fn bracket_label(bracket: &TaxBracket) -> String {
    band_label(bracket.min_income, bracket.max_income, bracket.rate_bps)
}

pub fn ter_label(config: &TerConfig) -> String {
    band_label(config.min_income, config.max_income, config.rate_bps)
}
