//! Account and role enumeration against the IAM Identity Center portal.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::auth::BearerToken;
use crate::error::{Result, SsoError};

const BEARER_TOKEN_HEADER: &str = "x-amz-sso_bearer_token";
const DEFAULT_PAGE_SIZE: u32 = 100;

/// Default portal endpoint for an IAM Identity Center region.
pub fn default_portal_endpoint(region: &str) -> String {
    format!("https://portal.sso.{region}.amazonaws.com")
}

/// One account/role combination the token grants.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceTuple {
    pub resource_id: String,
    pub resource_name: String,
    pub role_name: String,
}

impl ResourceTuple {
    pub fn new(
        resource_id: impl Into<String>,
        resource_name: impl Into<String>,
        role_name: impl Into<String>,
    ) -> Self {
        Self {
            resource_id: resource_id.into(),
            resource_name: resource_name.into(),
            role_name: role_name.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    pub account_id: String,
    pub account_name: String,
    #[serde(default)]
    pub email_address: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleInfo {
    pub role_name: String,
    #[serde(default)]
    pub account_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListAccountsResponse {
    #[serde(default)]
    account_list: Vec<AccountInfo>,
    #[serde(default)]
    next_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListAccountRolesResponse {
    #[serde(default)]
    role_list: Vec<RoleInfo>,
    #[serde(default)]
    next_token: Option<String>,
}

trait Page {
    type Item;
    fn into_parts(self) -> (Vec<Self::Item>, Option<String>);
}

impl Page for ListAccountsResponse {
    type Item = AccountInfo;
    fn into_parts(self) -> (Vec<AccountInfo>, Option<String>) {
        (self.account_list, self.next_token)
    }
}

impl Page for ListAccountRolesResponse {
    type Item = RoleInfo;
    fn into_parts(self) -> (Vec<RoleInfo>, Option<String>) {
        (self.role_list, self.next_token)
    }
}

/// Lists every account the token can reach and every role on each account.
///
/// # Example
/// ```no_run
/// use chrono::{Duration, Utc};
/// use sso_profiles::auth::BearerToken;
/// use sso_profiles::portal::ResourceEnumerator;
///
/// # async fn example() -> sso_profiles::error::Result<()> {
/// let token = BearerToken::expiring_in("access", Duration::hours(1), Utc::now());
/// let tuples = ResourceEnumerator::for_region("us-east-1").enumerate(&token).await?;
/// for tuple in &tuples {
///     println!("{} {} {}", tuple.resource_id, tuple.resource_name, tuple.role_name);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ResourceEnumerator {
    client: reqwest::Client,
    endpoint: String,
    page_size: u32,
}

impl ResourceEnumerator {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn for_region(region: &str) -> Self {
        Self::new(default_portal_endpoint(region))
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Every (account, role) pair the provider reports, in listing order.
    ///
    /// Accounts without roles contribute nothing.
    pub async fn enumerate(&self, token: &BearerToken) -> Result<Vec<ResourceTuple>> {
        let accounts = self.list_accounts(token).await?;
        tracing::info!(accounts = accounts.len(), "listed accessible accounts");

        let mut tuples = Vec::new();
        for account in accounts {
            let roles = self.list_account_roles(token, &account.account_id).await?;
            if roles.is_empty() {
                tracing::debug!(account_id = %account.account_id, "account has no roles");
            }
            tuples.extend(roles.into_iter().map(|role| {
                ResourceTuple::new(
                    account.account_id.clone(),
                    account.account_name.clone(),
                    role.role_name,
                )
            }));
        }
        Ok(tuples)
    }

    pub async fn list_accounts(&self, token: &BearerToken) -> Result<Vec<AccountInfo>> {
        self.drain::<ListAccountsResponse>(token, "assignment/accounts", &[])
            .await
    }

    pub async fn list_account_roles(
        &self,
        token: &BearerToken,
        account_id: &str,
    ) -> Result<Vec<RoleInfo>> {
        self.drain::<ListAccountRolesResponse>(
            token,
            "assignment/roles",
            &[("account_id", account_id)],
        )
        .await
    }

    async fn drain<P>(
        &self,
        token: &BearerToken,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<Vec<P::Item>>
    where
        P: Page + DeserializeOwned,
    {
        let url = format!("{}/{path}", self.endpoint);
        let page_size = self.page_size.to_string();
        let mut items = Vec::new();
        let mut next_token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let mut query: Vec<(&str, &str)> = params.to_vec();
            query.push(("max_result", page_size.as_str()));
            if let Some(next) = next_token.as_deref() {
                query.push(("next_token", next));
            }

            let resp = self
                .client
                .get(&url)
                .header(BEARER_TOKEN_HEADER, &token.value)
                .query(&query)
                .send()
                .await?;
            if !resp.status().is_success() {
                let status = resp.status().as_u16();
                let text = resp.text().await.unwrap_or_default();
                return Err(SsoError::portal(status, format!("{path}: {text}")));
            }
            let body = resp.text().await?;
            let page: P = serde_json::from_str(&body)?;
            let (page_items, token_for_next) = page.into_parts();
            pages += 1;
            items.extend(page_items);

            match token_for_next {
                Some(next) if !next.is_empty() => next_token = Some(next),
                _ => break,
            }
        }
        tracing::debug!(path, pages, items = items.len(), "drained paginated listing");
        Ok(items)
    }
}
