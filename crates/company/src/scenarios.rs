//! Contract scenarios for the company resource.
//!
//! Every scenario is self-contained: it purges stale records carrying the
//! CNPJ it is about to register, creates whatever it needs, and deletes it
//! again. Scenarios can therefore run in any order, or on their own.

use serde_json::json;
use vouch_application::{ApplicationResult, Dispatcher, HttpClient, TestContext, spec};
use vouch_domain::JsonPattern;

use crate::model::{
    CompanyApi, CompanyUpdate, DUPLICATE_CNPJ, MISSING_DELETE_ID, MISSING_ID, NewCompany,
    messages,
};

const COMPANY_ID: &str = "company_id";

/// Outcome of one scenario in a full run.
#[derive(Debug)]
pub struct ScenarioOutcome {
    /// Scenario name.
    pub name: &'static str,
    /// `Ok` when every step held.
    pub result: ApplicationResult<()>,
}

/// The company suite bound to one service and one dispatcher.
pub struct CompanySuite<C: HttpClient> {
    dispatcher: Dispatcher<C>,
    api: CompanyApi,
}

impl<C: HttpClient> CompanySuite<C> {
    /// Binds the suite to the service rooted at `base_url`.
    pub fn new(dispatcher: Dispatcher<C>, base_url: impl Into<String>) -> Self {
        Self {
            dispatcher,
            api: CompanyApi::new(base_url),
        }
    }

    /// URLs the suite targets.
    #[must_use]
    pub const fn api(&self) -> &CompanyApi {
        &self.api
    }

    /// Runs every scenario in declaration order and reports each outcome.
    /// A failing scenario does not stop the run.
    pub async fn run_all(&self) -> Vec<ScenarioOutcome> {
        let mut outcomes = Vec::with_capacity(15);
        let mut record = |name, result| outcomes.push(ScenarioOutcome { name, result });

        record("list companies", self.list_companies().await);
        record("create company", self.create_company().await);
        record("get company by id", self.get_company_by_id().await);
        record("update company", self.update_company().await);
        record("delete company", self.delete_company().await);
        record("get missing company", self.get_missing_company().await);
        record(
            "create without required fields",
            self.create_without_required_fields().await,
        );
        record("create with invalid cnpj", self.create_with_invalid_cnpj().await);
        record("update with invalid cnpj", self.update_with_invalid_cnpj().await);
        record("update missing company", self.update_missing_company().await);
        record("delete missing company", self.delete_missing_company().await);
        record("create duplicate cnpj", self.create_duplicate_cnpj().await);
        record("create several and list", self.create_several_and_list().await);
        record("patch collection", self.patch_collection().await);
        record("patch item", self.patch_item().await);

        for outcome in &outcomes {
            match &outcome.result {
                Ok(()) => tracing::info!(scenario = outcome.name, "passed"),
                Err(e) => tracing::error!(scenario = outcome.name, error = %e, "failed"),
            }
        }
        outcomes
    }

    /// `GET /company` answers 200 with an array.
    pub async fn list_companies(&self) -> ApplicationResult<()> {
        spec()
            .get(self.api.collection())
            .expect_status(200)
            .expect_json_like(json!([]))
            .run(&self.dispatcher)
            .await?;
        Ok(())
    }

    /// A valid company is created with a numeric id.
    pub async fn create_company(&self) -> ApplicationResult<()> {
        let company = NewCompany::valid();
        self.purge_cnpj(&company.cnpj).await?;

        let response = spec()
            .post(self.api.collection())
            .with_json(&company)
            .expect_status(201)
            .expect_json_like(
                JsonPattern::object()
                    .field("id", JsonPattern::regex(r"\d+")?)
                    .field("name", company.name.as_str()),
            )
            .run(&self.dispatcher)
            .await?;

        let mut ctx = TestContext::new();
        ctx.capture_from(COMPANY_ID, &response, "/id")?;
        self.remove(ctx.get_as(COMPANY_ID)?).await
    }

    /// A created company can be read back by id.
    pub async fn get_company_by_id(&self) -> ApplicationResult<()> {
        let ctx = self.seed(&NewCompany::valid()).await?;
        let id: u64 = ctx.get_as(COMPANY_ID)?;

        spec()
            .get(self.api.item(id))
            .expect_status(200)
            .expect_json_like(JsonPattern::object().field("id", id))
            .run(&self.dispatcher)
            .await?;

        self.remove(id).await
    }

    /// A valid update answers with the confirmation and the new fields.
    pub async fn update_company(&self) -> ApplicationResult<()> {
        let update = CompanyUpdate::valid();
        self.purge_cnpj(DUPLICATE_CNPJ).await?;
        let ctx = self.seed(&NewCompany::valid()).await?;
        let id: u64 = ctx.get_as(COMPANY_ID)?;

        spec()
            .put(self.api.item(id))
            .with_json(&update)
            .expect_status(200)
            .expect_json_like(json!({
                "message": messages::UPDATED,
                "company": {
                    "id": id,
                    "name": update.name,
                    "cnpj": update.cnpj,
                    "state": update.state,
                    "sector": update.sector,
                }
            }))
            .run(&self.dispatcher)
            .await?;

        self.remove(id).await
    }

    /// A created company can be deleted.
    pub async fn delete_company(&self) -> ApplicationResult<()> {
        let ctx = self.seed(&NewCompany::valid()).await?;
        self.remove(ctx.get_as(COMPANY_ID)?).await
    }

    /// Reading an unknown id answers 404.
    pub async fn get_missing_company(&self) -> ApplicationResult<()> {
        spec()
            .get(self.api.item(MISSING_ID))
            .expect_status(404)
            .run(&self.dispatcher)
            .await?;
        Ok(())
    }

    /// Missing CNPJ, state and sector are reported in that order.
    pub async fn create_without_required_fields(&self) -> ApplicationResult<()> {
        spec()
            .post(self.api.collection())
            .with_json(&json!({"name": "empresa invalida"}))
            .expect_status(400)
            .expect_json_like(json!({
                "errors": [
                    {"msg": messages::CNPJ_LENGTH},
                    {"msg": messages::STATE_REQUIRED},
                    {"msg": messages::SECTOR_REQUIRED},
                ]
            }))
            .run(&self.dispatcher)
            .await?;
        Ok(())
    }

    /// A non-numeric CNPJ is rejected on create.
    pub async fn create_with_invalid_cnpj(&self) -> ApplicationResult<()> {
        spec()
            .post(self.api.collection())
            .with_json(&NewCompany::with_invalid_cnpj())
            .expect_status(400)
            .expect_json_like(invalid_cnpj_errors())
            .run(&self.dispatcher)
            .await?;
        Ok(())
    }

    /// A non-numeric CNPJ is rejected on update.
    pub async fn update_with_invalid_cnpj(&self) -> ApplicationResult<()> {
        let ctx = self.seed(&NewCompany::valid()).await?;
        let id: u64 = ctx.get_as(COMPANY_ID)?;

        spec()
            .put(self.api.item(id))
            .with_json(&CompanyUpdate::with_invalid_cnpj())
            .expect_status(400)
            .expect_json_like(invalid_cnpj_errors())
            .run(&self.dispatcher)
            .await?;

        self.remove(id).await
    }

    /// Updating an unknown id answers 404.
    pub async fn update_missing_company(&self) -> ApplicationResult<()> {
        spec()
            .put(self.api.item(MISSING_ID))
            .with_json(&CompanyUpdate::rename("Empresa não existente"))
            .expect_status(404)
            .run(&self.dispatcher)
            .await?;
        Ok(())
    }

    /// Deleting an unknown id answers 404.
    pub async fn delete_missing_company(&self) -> ApplicationResult<()> {
        spec()
            .delete(self.api.item(MISSING_DELETE_ID))
            .expect_status(404)
            .run(&self.dispatcher)
            .await?;
        Ok(())
    }

    /// Registering a CNPJ twice is rejected.
    pub async fn create_duplicate_cnpj(&self) -> ApplicationResult<()> {
        let duplicate = NewCompany::duplicate();
        let ctx = self.seed(&duplicate).await?;

        spec()
            .post(self.api.collection())
            .with_json(&duplicate)
            .expect_status(400)
            .expect_json_like(json!({"errors": [{"msg": messages::CNPJ_TAKEN}]}))
            .run(&self.dispatcher)
            .await?;

        self.remove(ctx.get_as(COMPANY_ID)?).await
    }

    /// Several created companies all show up in the listing.
    pub async fn create_several_and_list(&self) -> ApplicationResult<()> {
        let mut ids = Vec::new();
        for company in NewCompany::batch() {
            let ctx = self.seed(&company).await?;
            ids.push(ctx.get_as::<u64>(COMPANY_ID)?);
        }

        spec()
            .get(self.api.collection())
            .expect_status(200)
            .expect_json_length_at_least(ids.len())
            .run(&self.dispatcher)
            .await?;

        for id in ids {
            self.remove(id).await?;
        }
        Ok(())
    }

    /// PATCH is not allowed on the collection.
    pub async fn patch_collection(&self) -> ApplicationResult<()> {
        spec()
            .patch(self.api.collection())
            .expect_status(405)
            .run(&self.dispatcher)
            .await?;
        Ok(())
    }

    /// PATCH is not allowed on an item.
    pub async fn patch_item(&self) -> ApplicationResult<()> {
        let ctx = self.seed(&NewCompany::valid()).await?;
        let id: u64 = ctx.get_as(COMPANY_ID)?;

        spec()
            .patch(self.api.item(id))
            .expect_status(405)
            .run(&self.dispatcher)
            .await?;

        self.remove(id).await
    }

    /// Creates `company` after purging its CNPJ and captures its id.
    async fn seed(&self, company: &NewCompany) -> ApplicationResult<TestContext> {
        self.purge_cnpj(&company.cnpj).await?;

        let response = spec()
            .post(self.api.collection())
            .with_json(company)
            .expect_status(201)
            .run(&self.dispatcher)
            .await?;

        let mut ctx = TestContext::new();
        ctx.capture_from(COMPANY_ID, &response, "/id")?;
        Ok(ctx)
    }

    async fn remove(&self, id: u64) -> ApplicationResult<()> {
        spec()
            .delete(self.api.item(id))
            .expect_status(200)
            .run(&self.dispatcher)
            .await?;
        Ok(())
    }

    /// Deletes every listed company registered under `cnpj`, left over from
    /// an earlier, interrupted run.
    async fn purge_cnpj(&self, cnpj: &str) -> ApplicationResult<()> {
        let listing = spec()
            .get(self.api.collection())
            .expect_status(200)
            .run(&self.dispatcher)
            .await?;

        let stale: Vec<u64> = listing
            .body
            .as_array()
            .into_iter()
            .flatten()
            .filter(|company| company.get("cnpj").and_then(|v| v.as_str()) == Some(cnpj))
            .filter_map(|company| company.get("id").and_then(serde_json::Value::as_u64))
            .collect();

        for id in stale {
            tracing::debug!(id, cnpj, "purging stale company");
            self.remove(id).await?;
        }
        Ok(())
    }
}

fn invalid_cnpj_errors() -> serde_json::Value {
    json!({
        "errors": [
            {"msg": messages::CNPJ_DIGITS_ONLY},
            {"msg": messages::CNPJ_LENGTH},
        ]
    })
}
