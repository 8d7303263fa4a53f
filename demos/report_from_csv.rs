use monthly_report_builder::{
    build_monthly_report, upcoming_months, Contract, MonthKey, ReportOptions, RowBatch,
};

const EXPENSES_CSV: &str = "\
Empresa,Tipo,Data Emissão Boleto,Valor Proposta,Valor do Boleto (R$)
Acme Ltda,Setup,10/06/2025,\"1.000,00\",\"900,00\"
Acme Ltda,Mensalidade,20/06/2025,\"500,50\",\"500,50\"
Bravo SA,Mensalidade,jul/2025,\"2.000,00\",\"2.100,00\"
";

fn main() -> anyhow::Result<()> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(EXPENSES_CSV.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
    let mut batch = RowBatch::new(headers);
    for record in reader.records() {
        batch.push_row(record?.iter().map(|c| c.to_string()).collect());
    }

    let contracts = vec![Contract {
        proposal_id: "P-2025-001".to_string(),
        installment_value: "1.200,00".to_string(),
        start_date: "01/01/2025".to_string(),
        end_date: "31/12/2025".to_string(),
        contract_type: "Mensalidade".to_string(),
    }];

    // Project the months following the newest sheet data.
    let last_day = chrono::NaiveDate::from_ymd_opt(2025, 7, 31).unwrap();
    let options = ReportOptions {
        projection_months: upcoming_months(last_day, 3),
        ..Default::default()
    };

    let report = build_monthly_report(&batch, &contracts, &options)?;

    println!(
        "{} months, proposal {:.2}, invoice {:.2}, difference {:.2}",
        report.summary.months_processed,
        report.summary.grand_proposal_total,
        report.summary.grand_invoice_total,
        report.summary.grand_difference_total,
    );

    for (month, bucket) in &report.summary.months {
        let tag = if bucket.is_projection { " (projection)" } else { "" };
        println!(
            "{}: proposal {:>10.2} | invoice {:>10.2} | {} records{}",
            month, bucket.proposal_total, bucket.invoice_total, bucket.record_count, tag
        );
    }

    let june = MonthKey::parse("2025-06").unwrap();
    let audit = report.audit_month(&june);
    println!(
        "audit {}: proposal delta {:.2}, invoice delta {:.2}, {} findings",
        june,
        audit.proposal_delta,
        audit.invoice_delta,
        audit.findings.len()
    );

    Ok(())
}
