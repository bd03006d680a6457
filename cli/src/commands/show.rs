//! Show one user's details.

use anyhow::{Result, bail};
use tracing::instrument;
use userdir_business::{User, UserDirectoryStore, UserId};

use crate::context::load_or_fail;
use crate::output::Output;

/// Label/value pairs shown on the detail card, in display order.
pub fn detail_lines(user: &User) -> Vec<(&'static str, String)> {
    vec![
        ("Username", user.username.clone()),
        ("Email", user.email.clone()),
        ("Phone", user.phone.clone()),
        ("Website", user.website.clone()),
        ("Address", user.address.to_string()),
        (
            "Location",
            format!("{}, {}", user.address.geo.lat, user.address.geo.lng),
        ),
        ("Company", user.company.name.clone()),
        ("Catchphrase", user.company.catch_phrase.clone()),
        ("BS", user.company.bs.clone()),
    ]
}

pub fn print_user(out: &Output, user: &User) {
    out.newline();
    out.header(format!("{} (#{})", user.name, user.id));
    for (label, value) in detail_lines(user) {
        out.labeled_indent(label, value, 2);
    }
    out.newline();
}

#[instrument(skip_all, name = "show", fields(id = id))]
pub async fn run_show(mut store: UserDirectoryStore, id: UserId) -> Result<()> {
    let out = Output::new();

    load_or_fail(&mut store).await?;
    let Some(user) = store.user(id) else {
        bail!("User {id} not found");
    };
    print_user(&out, user);

    store.shutdown().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::sample_user;

    #[test]
    fn test_detail_lines_cover_contact_address_and_company() {
        let user = sample_user(2, "Ervin Howell", "Shanna@melissa.tv");
        let lines = detail_lines(&user);

        let labels: Vec<&str> = lines.iter().map(|(label, _)| *label).collect();
        assert_eq!(
            labels,
            vec![
                "Username",
                "Email",
                "Phone",
                "Website",
                "Address",
                "Location",
                "Company",
                "Catchphrase",
                "BS"
            ]
        );
        assert_eq!(lines[1].1, "Shanna@melissa.tv");
        assert_eq!(
            lines[4].1,
            "Victor Plains, Suite 879, Wisokyburgh 90566-7771"
        );
        assert_eq!(lines[5].1, "-43.9509, -34.4618");
    }
}
