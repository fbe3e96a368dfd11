// Versioned publish protocol: latest document, deterministic snapshot
// directory, capped manifest, latest redirect. Steps are strictly ordered
// and each one's success is a precondition for the next. No rollback: the
// snapshot paths are deterministic overwrites, so the next scheduled run
// simply re-publishes after a partial failure.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono_tz::Tz;
use tracing::info;

use crate::localtime;
use crate::models::{Manifest, ManifestEntry, Report};
use crate::store::RemoteStore;

const LATEST_REPORT_PATH: &str = "hash-report.json";
const MANIFEST_PATH: &str = "reports/index.json";
const LATEST_REDIRECT_PATH: &str = "reports/latest/index.html";

pub struct Publisher {
    store: Arc<dyn RemoteStore>,
    tz: Tz,
    manifest_cap: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOutcome {
    pub snapshot_path: String,
    pub manifest_len: usize,
}

impl Publisher {
    pub fn new(store: Arc<dyn RemoteStore>, tz: Tz, manifest_cap: usize) -> Self {
        Self {
            store,
            tz,
            manifest_cap,
        }
    }

    pub async fn publish(&self, report: &Report) -> Result<PublishOutcome> {
        let document = serde_json::to_vec_pretty(report).context("serialize report")?;

        self.store
            .write(LATEST_REPORT_PATH, &document, "Update hash-report.json")
            .await
            .context("write latest report")?;

        let dir_name = localtime::snapshot_dir_name(report.generated_at, self.tz);
        let label = localtime::human_label(report.generated_at, self.tz);
        let snapshot_path = format!("/reports/{dir_name}/");

        self.store
            .write(
                &format!("reports/{dir_name}/hash-report.json"),
                &document,
                &format!("Add reports/{dir_name}/hash-report.json"),
            )
            .await
            .context("write snapshot report")?;
        self.store
            .write(
                &format!("reports/{dir_name}/index.html"),
                report_page(&label).as_bytes(),
                &format!("Add reports/{dir_name}/index.html"),
            )
            .await
            .context("write snapshot page")?;

        let manifest = self
            .update_manifest(ManifestEntry {
                path: snapshot_path.clone(),
                label,
                generated_at: report.generated_at,
                snapshot_ts: report.current_snapshot_ts,
            })
            .await?;

        self.store
            .write(
                LATEST_REDIRECT_PATH,
                latest_redirect_page().as_bytes(),
                "Update latest redirect",
            )
            .await
            .context("write latest redirect")?;

        info!(
            snapshot_path = %snapshot_path,
            manifest_len = manifest.reports.len(),
            "report published"
        );
        Ok(PublishOutcome {
            snapshot_path,
            manifest_len: manifest.reports.len(),
        })
    }

    /// Read-modify-write. NotFound reads as an empty manifest; the entry is
    /// deduplicated by path, prepended, and the tail beyond the cap dropped.
    async fn update_manifest(&self, entry: ManifestEntry) -> Result<Manifest> {
        let mut manifest = match self
            .store
            .read(MANIFEST_PATH)
            .await
            .context("read manifest")?
        {
            Some(file) => serde_json::from_slice(&file.content).context("parse manifest")?,
            None => Manifest::default(),
        };
        manifest.insert(entry, self.manifest_cap);
        let body = serde_json::to_vec_pretty(&manifest).context("serialize manifest")?;
        self.store
            .write(MANIFEST_PATH, &body, "Update reports index")
            .await
            .context("write manifest")?;
        Ok(manifest)
    }
}

/// Snapshot viewer stub: a titled page that loads the adjacent report
/// document.
fn report_page(title: &str) -> String {
    format!(
        r#"<!doctype html><html><head><meta charset="utf-8"><title>Hash Report — {title}</title>
<meta name="viewport" content="width=device-width, initial-scale=1"/>
</head><body><pre id="report">Loading…</pre>
<script>
fetch('hash-report.json', {{cache: 'no-cache'}})
  .then(r => r.json())
  .then(j => {{ document.getElementById('report').textContent = JSON.stringify(j, null, 2); }})
  .catch(() => {{ document.getElementById('report').textContent = 'Unable to load report.'; }});
</script>
</body></html>
"#
    )
}

/// Redirect page: reads the manifest at load time and navigates to its first
/// (newest) entry.
fn latest_redirect_page() -> String {
    r#"<!doctype html><html><head><meta charset="utf-8"><title>Latest Hash Report</title>
<meta name="viewport" content="width=device-width, initial-scale=1"/>
<script>
(async function(){
  try{
    const r = await fetch('/reports/index.json', {cache:'no-cache'});
    const m = await r.json();
    const first = m?.reports?.[0]?.path;
    if(first){ location.replace(first); }
    else { document.body.innerHTML = '<p>No reports yet.</p>'; }
  }catch(e){
    document.body.innerHTML = '<p>Unable to load latest report.</p>';
  }
})();
</script>
</head><body></body></html>
"#
    .to_string()
}
