//! Company registration commands

use crate::error::Result;
use crate::models::Company;
use crate::store::AuditDb;
use tracing::info;

/// Register a company; the website is validated and normalized
pub async fn cmd_add_company(
    db: &AuditDb,
    name: &str,
    website: &str,
    industry: Option<String>,
) -> Result<Company> {
    let company = Company::new(name, website, industry)?;
    db.insert_company(&company).await?;
    info!(company_id = %company.id, website = %company.website, "Company registered");
    Ok(company)
}

pub async fn cmd_list_companies(db: &AuditDb) -> Result<Vec<Company>> {
    db.list_companies().await
}

/// Print companies list to console
pub fn print_companies(companies: &[Company]) {
    println!("\n🏢 Registered Companies\n");

    if companies.is_empty() {
        println!("No companies registered. Use 'sitescore company add' to register one.");
        return;
    }

    for company in companies {
        println!("• {}", company.name);
        println!("  ID: {}", company.id);
        println!("  Website: {}", company.website);
        if let Some(industry) = &company.industry {
            println!("  Industry: {}", industry);
        }
        println!("  Added: {}", company.created_at);
        println!();
    }
}
