//! # Invoice Commands
//!
//! Raw UI input is turned into [`BillingDetails`] here: the tax rate is
//! parsed as a percentage, the status by name and a scanned bank code is
//! normalized (whitespace stripped, uppercased) before it reaches the engine.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ApiError;
use mostrador_core::invoice::BillingDetails;
use mostrador_core::validation::normalize_bank_code;
use mostrador_core::{non_blank, BillingConfig, Invoice, InvoiceStatus, TaxRate};
use mostrador_db::{Database, InvoiceFilter};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDto {
    pub id: String,
    pub invoice_number: String,
    pub sale_id: String,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_address: Option<String>,
    pub customer_cuit: Option<String>,
    pub iban_code: Option<String>,
    pub subtotal: String,
    /// Display form, e.g. `"21%"`.
    pub tax_rate: String,
    pub tax_rate_bps: u32,
    pub tax_amount: String,
    pub total: String,
    pub total_cents: i64,
    pub status: InvoiceStatus,
    pub due_date: NaiveDate,
    pub created: DateTime<Utc>,
}

impl From<Invoice> for InvoiceDto {
    fn from(inv: Invoice) -> Self {
        InvoiceDto {
            id: inv.id,
            invoice_number: inv.invoice_number,
            sale_id: inv.sale_id,
            customer_name: inv.customer_name,
            customer_email: inv.customer_email,
            customer_address: inv.customer_address,
            customer_cuit: inv.customer_cuit,
            iban_code: inv.iban_code,
            subtotal: inv.subtotal.to_decimal_string(),
            tax_rate: inv.tax_rate.to_string(),
            tax_rate_bps: inv.tax_rate.bps(),
            tax_amount: inv.tax_amount.to_decimal_string(),
            total: inv.total.to_decimal_string(),
            total_cents: inv.total.cents(),
            status: inv.status,
            due_date: inv.due_date,
            created: inv.created,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InvoiceRequest {
    pub sale_id: String,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_address: Option<String>,
    pub customer_cuit: Option<String>,
    /// As scanned or typed; spaces allowed.
    pub iban_code: Option<String>,
    /// Percentage text such as `"21"` or `"10.5"`.
    pub tax_rate: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub invoice_number: Option<String>,
    /// `draft` when unset.
    pub status: Option<String>,
}

impl InvoiceRequest {
    pub fn billing_details(&self) -> Result<BillingDetails, ApiError> {
        let iban_code = non_blank(self.iban_code.clone())
            .map(|raw| normalize_bank_code(&raw))
            .transpose()?;

        let tax_rate = non_blank(self.tax_rate.clone())
            .map(|raw| TaxRate::parse_percentage(&raw))
            .transpose()?;

        let status = non_blank(self.status.clone())
            .map(|raw| InvoiceStatus::from_str(&raw))
            .transpose()?;

        Ok(BillingDetails {
            customer_name: self.customer_name.clone(),
            customer_email: self.customer_email.clone(),
            customer_address: self.customer_address.clone(),
            customer_cuit: self.customer_cuit.clone(),
            iban_code,
            tax_rate,
            due_date: self.due_date,
            invoice_number: self.invoice_number.clone(),
            status,
        })
    }
}

/// Generates the invoice for a completed sale.
pub async fn generate_invoice(
    db: &Database,
    billing: &BillingConfig,
    request: InvoiceRequest,
) -> Result<InvoiceDto, ApiError> {
    let details = request.billing_details()?;

    let invoice = db
        .invoice_generator_with(billing.clone())
        .generate_invoice(request.sale_id.trim(), &details)
        .await?;

    Ok(invoice.into())
}

/// Moves an invoice to `status` (`sent`, `paid`, `overdue`).
pub async fn mark_invoice(db: &Database, invoice_id: &str, status: &str) -> Result<InvoiceDto, ApiError> {
    let next = InvoiceStatus::from_str(status)?;
    let invoice = db.invoice_generator().transition_invoice(invoice_id, next).await?;
    Ok(invoice.into())
}

/// Looks an invoice up by id, then by number.
pub async fn get_invoice(db: &Database, reference: &str) -> Result<InvoiceDto, ApiError> {
    let invoices = db.invoices();

    if let Some(invoice) = invoices.get_by_id(reference).await? {
        return Ok(invoice.into());
    }

    invoices
        .get_by_number(reference)
        .await?
        .map(InvoiceDto::from)
        .ok_or_else(|| ApiError::not_found("Invoice", reference))
}

/// Invoices newest first.
pub async fn list_invoices(
    db: &Database,
    status: Option<&str>,
    limit: Option<u32>,
) -> Result<Vec<InvoiceDto>, ApiError> {
    let filter = InvoiceFilter {
        status: status.map(InvoiceStatus::from_str).transpose()?,
        sale_id: None,
        limit,
    };

    let invoices = db.invoices().list(&filter).await?;
    Ok(invoices.into_iter().map(InvoiceDto::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::product::{create_product, CreateProductRequest};
    use crate::commands::sale::{sell, SellRequest};
    use crate::error::ErrorCode;
    use mostrador_db::DbConfig;

    async fn sold(db: &Database, pending: bool) -> String {
        create_product(
            db,
            CreateProductRequest {
                code: format!("TV-{}", pending as u8),
                name: "Televisor".to_string(),
                price: "1000".to_string(),
                stock: 5,
                category: "electro".to_string(),
                description: None,
            },
        )
        .await
        .unwrap();

        sell(
            db,
            SellRequest {
                lines: vec![format!("TV-{}:1", pending as u8).parse().unwrap()],
                customer_name: Some("Ana".to_string()),
                pending,
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .id
    }

    #[test]
    fn test_billing_details_normalizes_input() {
        let details = InvoiceRequest {
            sale_id: "s".to_string(),
            iban_code: Some(" es91 2100 0418 4502 0005 1332 ".to_string()),
            tax_rate: Some("10.5".to_string()),
            status: Some("Sent".to_string()),
            ..Default::default()
        }
        .billing_details()
        .unwrap();

        assert_eq!(details.iban_code.as_deref(), Some("ES9121000418450200051332"));
        assert_eq!(details.tax_rate, Some(TaxRate::from_bps(1050)));
        assert_eq!(details.status, Some(InvoiceStatus::Sent));

        let err = InvoiceRequest {
            iban_code: Some("1234".to_string()),
            ..Default::default()
        }
        .billing_details()
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_generate_list_and_mark() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let sale_id = sold(&db, false).await;

        let invoice = generate_invoice(
            &db,
            &BillingConfig::default(),
            InvoiceRequest {
                sale_id: sale_id.clone(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(invoice.subtotal, "1000.00");
        assert_eq!(invoice.tax_rate, "21%");
        assert_eq!(invoice.tax_amount, "210.00");
        assert_eq!(invoice.total, "1210.00");
        assert_eq!(invoice.customer_name, "Ana");

        let fetched = get_invoice(&db, &invoice.invoice_number).await.unwrap();
        assert_eq!(fetched.id, invoice.id);

        let sent = mark_invoice(&db, &invoice.id, "sent").await.unwrap();
        assert_eq!(sent.status, InvoiceStatus::Sent);
        let err = mark_invoice(&db, &invoice.id, "draft").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessLogic);

        assert_eq!(list_invoices(&db, Some("sent"), None).await.unwrap().len(), 1);
        assert!(list_invoices(&db, Some("draft"), None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_pending_sale_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let sale_id = sold(&db, true).await;

        let err = generate_invoice(
            &db,
            &BillingConfig::default(),
            InvoiceRequest {
                sale_id,
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

        assert_eq!(err.code, ErrorCode::SaleNotBillable);
        assert!(list_invoices(&db, None, None).await.unwrap().is_empty());
    }
}
