use crate::error::IngestError;
use crate::schema::NewLead;
use crate::store::{LeadStore, UpsertReport};

/// Parses a CSV batch into lead rows. Headers are trimmed and matched
/// case-insensitively; unknown columns are ignored and missing columns
/// leave the field empty. Field values are passed through as supplied
/// (emails stay case-sensitive).
pub fn parse_batch(data: &[u8]) -> Result<Vec<NewLead>, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(data);

    let headers = reader.headers()?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|header| header.eq_ignore_ascii_case(name))
    };
    let name_idx = column("name");
    let email_idx = column("email");
    let company_idx = column("company");
    let role_idx = column("role");
    let topic_idx = column("topic");

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let field = |idx: Option<usize>| {
            idx.and_then(|i| record.get(i))
                .unwrap_or_default()
                .to_string()
        };
        rows.push(NewLead {
            name: field(name_idx),
            email: field(email_idx),
            company: field(company_idx),
            role: field(role_idx),
            topic: field(topic_idx),
        });
    }
    Ok(rows)
}

/// Parses and upserts a CSV batch. All parsed rows go to the store,
/// which does the missing-name/email accounting; a batch the store
/// accepted nothing from is a usage error.
pub async fn ingest_csv(
    store: &dyn LeadStore,
    data: &[u8],
) -> Result<UpsertReport, IngestError> {
    let rows = parse_batch(data)?;
    let report = store.upsert_batch(&rows).await?;
    if report.accepted == 0 {
        return Err(IngestError::NoValidRows);
    }
    tracing::info!(
        accepted = report.accepted,
        skipped = report.skipped,
        "ingested lead batch"
    );
    Ok(report)
}
