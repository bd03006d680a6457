//! Print the user list.

use anyhow::Result;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tracing::instrument;
use userdir_business::{User, UserDirectoryStore, UserId};

use crate::context::load_or_fail;
use crate::output::Output;

#[derive(Debug, Tabled)]
struct UserRow {
    #[tabled(rename = "ID")]
    id: UserId,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Username")]
    username: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "City")]
    city: String,
    #[tabled(rename = "Company")]
    company: String,
}

impl From<&User> for UserRow {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            city: user.address.city.clone(),
            company: user.company.name.clone(),
        }
    }
}

#[instrument(skip_all, name = "list", fields(query = query.as_deref().unwrap_or("")))]
pub async fn run_list(mut store: UserDirectoryStore, query: Option<String>) -> Result<()> {
    let out = Output::new();

    load_or_fail(&mut store).await?;
    if let Some(query) = query {
        store.set_search_query(query);
    }

    let users = store.filtered_users();
    if users.is_empty() {
        out.dim("No users found.");
    } else {
        let rows: Vec<UserRow> = users.iter().map(UserRow::from).collect();
        let mut table = Table::new(&rows);
        table.with(Style::rounded());
        out.print(table.to_string());
        out.count("Users", users.len());
    }

    store.shutdown().await;
    Ok(())
}
