use std::collections::{BTreeMap, BTreeSet};

use tracing::warn;

use crate::model::{Scheme, Security, SecurityType};

use super::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IsinOutcome {
    Empty,
    Accepted,
    Duplicate,
    Rejected,
}

#[derive(Debug, Default)]
pub(crate) struct MetadataAccumulator {
    schemes: BTreeMap<i64, String>,
    securities: BTreeMap<String, (i64, SecurityType)>,
    rejected_isins: BTreeSet<String>,
}

impl MetadataAccumulator {
    pub(crate) fn record_scheme(&mut self, scheme_code: i64, scheme_name: &str) -> bool {
        if self.schemes.contains_key(&scheme_code) {
            return false;
        }
        self.schemes.insert(scheme_code, scheme_name.trim().to_string());
        true
    }

    pub(crate) fn record_isin(
        &mut self,
        raw: &str,
        scheme_code: i64,
        security_type: SecurityType,
    ) -> IsinOutcome {
        let raw = raw.trim();
        if raw.is_empty() {
            return IsinOutcome::Empty;
        }

        let Some(isin) = normalize_isin(raw) else {
            let raw = raw.to_uppercase();
            if !self.rejected_isins.contains(&raw) {
                warn!(isin = %raw, scheme_code, "invalid ISIN dropped");
                self.rejected_isins.insert(raw);
            }
            return IsinOutcome::Rejected;
        };

        if self.securities.contains_key(&isin) {
            return IsinOutcome::Duplicate;
        }
        self.securities.insert(isin, (scheme_code, security_type));
        IsinOutcome::Accepted
    }

    pub(crate) fn schemes(&self) -> impl Iterator<Item = Scheme> + '_ {
        self.schemes.iter().map(|(code, name)| Scheme {
            scheme_code: *code,
            scheme_name: name.clone(),
        })
    }

    pub(crate) fn securities(&self) -> impl Iterator<Item = Security> + '_ {
        self.securities
            .iter()
            .map(|(isin, (scheme_code, security_type))| Security {
                isin: isin.clone(),
                security_type: *security_type,
                scheme_code: *scheme_code,
            })
    }

    pub(crate) fn scheme_count(&self) -> usize {
        self.schemes.len()
    }

    pub(crate) fn security_count(&self) -> usize {
        self.securities.len()
    }

    pub(crate) fn rejected_isins(&self) -> impl Iterator<Item = &str> + '_ {
        self.rejected_isins.iter().map(String::as_str)
    }
}
