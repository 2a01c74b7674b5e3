use serde_json::Value;
use url::Url;

use crate::catalog::{CatalogClient, endpoint};
use crate::domain::{Identifier, MetagenomeId, ProjectId};
use crate::error::MgError;

pub fn project_url(api: &Url, project: &ProjectId) -> Result<Url, MgError> {
    let mut url = endpoint(api, &["project", project.as_str()])?;
    url.query_pairs_mut().append_pair("verbosity", "full");
    Ok(url)
}

/// Member metagenomes of `identifier`, in server order with repeats kept.
/// A metagenome id resolves to itself without touching the network.
pub fn resolve_metagenomes<C: CatalogClient + ?Sized>(
    client: &C,
    api: &Url,
    identifier: &Identifier,
) -> Result<Vec<MetagenomeId>, MgError> {
    match identifier {
        Identifier::Metagenome(mg) => Ok(vec![mg.clone()]),
        Identifier::Project(project) => {
            let url = project_url(api, project)?;
            let value = client.fetch_json(&url)?;
            project_members(project, &value)
        }
    }
}

fn project_members(project: &ProjectId, value: &Value) -> Result<Vec<MetagenomeId>, MgError> {
    let entries = value
        .get("metagenomes")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            MgError::MalformedResponse(format!("{project}: missing \"metagenomes\" array"))
        })?;

    entries
        .iter()
        .enumerate()
        .map(|(position, entry)| {
            member_id(entry)
                .ok_or_else(|| {
                    MgError::MalformedResponse(format!(
                        "{project}: metagenome entry {position} has no id"
                    ))
                })?
                .parse()
                .map_err(|_| {
                    MgError::MalformedResponse(format!(
                        "{project}: metagenome entry {position} has a blank id"
                    ))
                })
        })
        .collect()
}

// Entries are usually `[id, name, ...]`; some deployments return objects.
fn member_id(entry: &Value) -> Option<&str> {
    match entry {
        Value::Array(fields) => fields.first().and_then(Value::as_str),
        Value::Object(fields) => fields
            .get("id")
            .or_else(|| fields.get("metagenome_id"))
            .and_then(Value::as_str),
        Value::String(id) => Some(id.as_str()),
        _ => None,
    }
}
