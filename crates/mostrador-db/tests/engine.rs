//! End-to-end checks of the sale and invoice engine against SQLite.

use mostrador_core::cart::CartLine;
use mostrador_core::invoice::BillingDetails;
use mostrador_core::validation::normalize_bank_code;
use mostrador_core::{
    CoreError, Customer, InvoiceStatus, Money, Product, SaleStatus, TaxRate, MAX_PRICE_CENTS,
};
use mostrador_db::{Database, DbConfig, InvoiceFilter, ServiceError};

async fn memory_db() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

async fn add_product(db: &Database, code: &str, price_cents: i64, stock: i64) -> Product {
    let product = Product::new(code, code, Money::from_cents(price_cents), stock, "general").unwrap();
    db.products().insert(&product).await.unwrap()
}

async fn stock_of(db: &Database, id: &str) -> i64 {
    db.products().get_by_id(id).await.unwrap().unwrap().stock
}

fn customer(name: &str) -> Customer {
    Customer::new(Some(name.to_string()), None)
}

#[tokio::test]
async fn stock_never_negative_across_sales() {
    let db = memory_db().await;
    let a = add_product(&db, "A", 1_000, 7).await;
    let b = add_product(&db, "B", 2_500, 4).await;
    let processor = db.sale_processor();

    let attempts = [(3, 1), (2, 2), (4, 0), (1, 1), (1, 3), (1, 0), (1, 0)];
    let mut succeeded = 0;

    for (qa, qb) in attempts {
        let mut lines = vec![CartLine::new(&a.id, qa)];
        if qb > 0 {
            lines.push(CartLine::new(&b.id, qb));
        }
        if processor.commit_sale(&lines, Customer::default()).await.is_ok() {
            succeeded += 1;
        }

        assert!(stock_of(&db, &a.id).await >= 0);
        assert!(stock_of(&db, &b.id).await >= 0);
    }

    // (3,1) (2,2) ok; (4,0) over; (1,1) ok; (1,3) over on B; (1,0) ok; (1,0) over
    assert_eq!(succeeded, 4);
    assert_eq!(stock_of(&db, &a.id).await, 0);
    assert_eq!(stock_of(&db, &b.id).await, 0);
    assert_eq!(
        db.sales().count_by_status(SaleStatus::Completed).await.unwrap(),
        4
    );
}

#[tokio::test]
async fn combined_over_request_changes_nothing() {
    let db = memory_db().await;
    let a = add_product(&db, "A", 1_000, 10).await;
    let b = add_product(&db, "B", 1_000, 4).await;

    // 3 + 2 of B exceeds 4 only once the lines are combined
    let err = db
        .sale_processor()
        .commit_sale(
            &[
                CartLine::new(&a.id, 5),
                CartLine::new(&b.id, 3),
                CartLine::new(&b.id, 2),
            ],
            Customer::default(),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ServiceError::Core(CoreError::InsufficientStock { requested: 5, available: 4, .. })
    ));
    assert_eq!(stock_of(&db, &a.id).await, 10);
    assert_eq!(stock_of(&db, &b.id).await, 4);
    assert_eq!(db.sales().count_by_status(SaleStatus::Completed).await.unwrap(), 0);
}

#[tokio::test]
async fn repeated_lines_commit_as_one() {
    let db = memory_db().await;
    let p = add_product(&db, "MATE", 12_345, 10).await;
    let q = add_product(&db, "BOMB", 500, 10).await;

    let sale = db
        .sale_processor()
        .commit_sale(
            &[
                CartLine::new(&p.id, 2),
                CartLine::new(&q.id, 1),
                CartLine::new(&p.id, 3),
            ],
            customer("Ana"),
        )
        .await
        .unwrap();

    assert_eq!(sale.items.len(), 2);
    assert_eq!(sale.items[0].product_id, p.id);
    assert_eq!(sale.items[0].quantity, 5);
    assert_eq!(sale.items[0].line_total, Money::from_cents(5 * 12_345));

    let sum = sale
        .items
        .iter()
        .fold(Money::zero(), |acc, item| acc + item.line_total);
    assert_eq!(sale.total, sum);
    assert_eq!(sale.total, Money::from_cents(61_725 + 500));

    assert_eq!(stock_of(&db, &p.id).await, 5);
    assert_eq!(stock_of(&db, &q.id).await, 9);

    let stored = db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
    assert_eq!(stored, sale);
}

#[tokio::test]
async fn invoice_of_thousand_at_twenty_one_percent() {
    let db = memory_db().await;
    let p = add_product(&db, "TV", 100_000, 1).await;

    let sale = db
        .sale_processor()
        .commit_sale(&[CartLine::new(&p.id, 1)], customer("Ana"))
        .await
        .unwrap();

    let invoice = db
        .invoice_generator()
        .generate_invoice(
            &sale.id,
            &BillingDetails::new()
                .tax_rate(TaxRate::from_bps(2100))
                .iban_code("ES91 2100 0418 4502 0005 1332"),
        )
        .await
        .unwrap();

    assert_eq!(invoice.subtotal, Money::from_cents(100_000));
    assert_eq!(invoice.tax_amount, Money::from_cents(21_000));
    assert_eq!(invoice.total, Money::from_cents(121_000));
    assert_eq!(invoice.customer_name, "Ana");
    assert_eq!(invoice.iban_code.as_deref(), Some("ES9121000418450200051332"));
    assert_eq!(invoice.status, InvoiceStatus::Draft);

    let reread = db.invoices().get_by_id(&invoice.id).await.unwrap().unwrap();
    assert_eq!(reread.subtotal, invoice.subtotal);
    assert_eq!(reread.tax_rate, invoice.tax_rate);
    assert_eq!(reread.tax_amount, invoice.tax_amount);
    assert_eq!(reread.total, invoice.total);

    // Status changes leave the money alone
    let sent = db
        .invoice_generator()
        .transition_invoice(&invoice.id, InvoiceStatus::Sent)
        .await
        .unwrap();
    assert_eq!(sent.total, invoice.total);
    assert_eq!(sent.tax_amount, invoice.tax_amount);
}

#[tokio::test]
async fn pending_sale_is_not_billable() {
    let db = memory_db().await;
    let p = add_product(&db, "P", 1_000, 5).await;

    let sale = db
        .sale_processor()
        .create_pending_sale(&[CartLine::new(&p.id, 2)], customer("Ana"))
        .await
        .unwrap();
    assert_eq!(stock_of(&db, &p.id).await, 5);

    let err = db
        .invoice_generator()
        .generate_invoice(&sale.id, &BillingDetails::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Core(CoreError::SaleNotBillable { .. })));
    assert_eq!(db.invoices().count().await.unwrap(), 0);

    // Completing it reserves stock and makes it billable
    db.sale_processor().complete_pending_sale(&sale.id).await.unwrap();
    assert_eq!(stock_of(&db, &p.id).await, 3);

    db.invoice_generator()
        .generate_invoice(&sale.id, &BillingDetails::new())
        .await
        .unwrap();

    let second = db
        .invoice_generator()
        .generate_invoice(&sale.id, &BillingDetails::new())
        .await
        .unwrap_err();
    assert!(matches!(second, ServiceError::Core(CoreError::SaleAlreadyInvoiced(_))));

    let listed = db
        .invoices()
        .list(&InvoiceFilter {
            sale_id: Some(sale.id.clone()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
}

async fn file_db(dir: &tempfile::TempDir) -> Database {
    Database::new(DbConfig::new(dir.path().join("engine.db")).max_connections(8))
        .await
        .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_sales_for_last_units() {
    let dir = tempfile::tempdir().unwrap();
    let db = file_db(&dir).await;
    let p = add_product(&db, "LAST", 9_900, 8).await;

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let processor = db.sale_processor();
            let lines = vec![CartLine::new(&p.id, 1)];
            tokio::spawn(async move { processor.commit_sale(&lines, Customer::default()).await })
        })
        .collect();

    let mut ok = 0;
    let mut short = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => ok += 1,
            Err(ServiceError::Core(CoreError::InsufficientStock { .. })) => short += 1,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(ok, 8);
    assert_eq!(short, 8);
    assert_eq!(stock_of(&db, &p.id).await, 0);
    assert_eq!(db.sales().count_by_status(SaleStatus::Completed).await.unwrap(), 8);

    db.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_invoices_for_distinct_sales() {
    let dir = tempfile::tempdir().unwrap();
    let db = file_db(&dir).await;
    let p = add_product(&db, "BULK", 1_000, 16).await;

    let mut sale_ids = Vec::new();
    for _ in 0..16 {
        let sale = db
            .sale_processor()
            .commit_sale(&[CartLine::new(&p.id, 1)], customer("Ana"))
            .await
            .unwrap();
        sale_ids.push(sale.id);
    }

    let handles: Vec<_> = sale_ids
        .iter()
        .enumerate()
        .map(|(i, sale_id)| {
            let generator = db.invoice_generator();
            let sale_id = sale_id.clone();
            tokio::spawn(async move {
                let details = BillingDetails::new().invoice_number(format!("A-{i}"));
                generator.generate_invoice(&sale_id, &details).await
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(db.invoices().count().await.unwrap(), 16);

    db.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_invoice_and_cancel_agree() {
    let dir = tempfile::tempdir().unwrap();
    let db = file_db(&dir).await;
    let p = add_product(&db, "RACE", 1_000, 10).await;

    for _ in 0..8 {
        let sale = db
            .sale_processor()
            .commit_sale(&[CartLine::new(&p.id, 1)], customer("Ana"))
            .await
            .unwrap();

        let generator = db.invoice_generator();
        let processor = db.sale_processor();
        let (invoice_sale, cancel_sale) = (sale.id.clone(), sale.id.clone());

        let invoice = tokio::spawn(async move {
            generator
                .generate_invoice(&invoice_sale, &BillingDetails::new())
                .await
        });
        let cancel = tokio::spawn(async move { processor.cancel_sale(&cancel_sale).await });

        let invoice = invoice.await.unwrap();
        let cancel = cancel.await.unwrap();
        let stored = db.sales().get_by_id(&sale.id).await.unwrap().unwrap();

        match (invoice, cancel) {
            (Ok(_), Err(ServiceError::Core(CoreError::SaleAlreadyInvoiced(_)))) => {
                assert_eq!(stored.status, SaleStatus::Completed);
            }
            (Err(ServiceError::Core(CoreError::SaleNotBillable { .. })), Ok(_)) => {
                assert_eq!(stored.status, SaleStatus::Cancelled);
                assert!(db
                    .invoices()
                    .list(&InvoiceFilter {
                        sale_id: Some(sale.id.clone()),
                        ..Default::default()
                    })
                    .await
                    .unwrap()
                    .is_empty());
            }
            other => panic!("invoice and cancel both won or both lost: {other:?}"),
        }
    }

    db.close().await;
}

#[tokio::test]
async fn oversized_quantities_and_prices_are_rejected() {
    let db = memory_db().await;
    let p = add_product(&db, "Q", 1_000, 5).await;
    let processor = db.sale_processor();

    let lines = [CartLine::new(&p.id, i64::MAX), CartLine::new(&p.id, 1)];
    assert!(matches!(
        processor.commit_sale(&lines, Customer::default()).await,
        Err(ServiceError::Core(CoreError::QuantityTooLarge { .. }))
    ));
    assert!(matches!(
        processor.create_pending_sale(&lines, Customer::default()).await,
        Err(ServiceError::Core(CoreError::QuantityTooLarge { .. }))
    ));
    assert_eq!(stock_of(&db, &p.id).await, 5);
    assert_eq!(db.sales().list(&Default::default()).await.unwrap().len(), 0);

    assert!(Product::new("BIG", "Big", Money::from_cents(MAX_PRICE_CENTS + 1), 1, "general").is_err());

    // the priciest allowed line still totals and taxes without overflow
    let top = add_product(&db, "TOP", MAX_PRICE_CENTS, 999).await;
    let sale = processor
        .commit_sale(&[CartLine::new(&top.id, 999)], customer("Ana"))
        .await
        .unwrap();
    let invoice = db
        .invoice_generator()
        .generate_invoice(&sale.id, &BillingDetails::new().tax_rate(TaxRate::from_bps(10_000)))
        .await
        .unwrap();
    assert_eq!(invoice.total.cents(), MAX_PRICE_CENTS * 999 * 2);
}

#[test]
fn bank_code_input_adapter() {
    assert_eq!(
        normalize_bank_code("ES91 2100 0418 4502 0005 1332").unwrap(),
        "ES9121000418450200051332"
    );
    assert!(normalize_bank_code("1234").is_err());
    assert!(normalize_bank_code("   ").is_err());
}
