// src/matching/manager.rs - exact/similar duplicate detection over extracted customer records
use chrono::Utc;
use std::cmp::Ordering;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

use crate::matching::address::{best_candidate, completeness_score, records_look_similar};
use crate::matching::keys::grouping_key;
use crate::matching::name::{mean_pairwise_similarity, normalize};
use crate::models::{CustomerRecord, DedupStats, DuplicateGroup, KeyStrategy};
use crate::utils::progress_bars::logging::{DedupLogger, PipelineStage};

#[derive(Debug, Clone)]
pub struct DedupResult {
    /// Every accepted input record exactly once, sorted by name then address line 1.
    pub records: Vec<CustomerRecord>,
    /// Keys shared by two or more records; indices point into `records`.
    pub groups: Vec<DuplicateGroup>,
    pub stats: DedupStats,
}

impl DedupResult {
    pub fn unique_records(&self) -> impl Iterator<Item = &CustomerRecord> {
        self.records.iter().filter(|r| !r.is_duplicate)
    }

    pub fn duplicate_records(&self) -> impl Iterator<Item = &CustomerRecord> {
        self.records.iter().filter(|r| r.is_duplicate)
    }

    /// Records exported when the user changes nothing.
    pub fn selected_records(&self) -> Vec<CustomerRecord> {
        self.records
            .iter()
            .filter(|r| r.is_selected_by_default())
            .cloned()
            .collect()
    }

    pub fn group_of(&self, index: usize) -> Option<&DuplicateGroup> {
        self.groups.iter().find(|g| g.contains(index))
    }
}

fn sort_key(s: &str) -> String {
    s.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// Accent- and case-insensitive ordering, so "École" sorts with the e's.
/// Callers rely on a stable sort to keep input order among values that
/// differ only by case or accents. Language-specific collation rules
/// (e.g. Swedish "å" after "z") are not applied.
pub fn locale_compare(a: &str, b: &str) -> Ordering {
    sort_key(a).cmp(&sort_key(b))
}

fn source_mentions(existing: &str, incoming: &str) -> bool {
    incoming.trim().is_empty() || existing.to_lowercase().contains(&incoming.trim().to_lowercase())
}

fn comparison_text(record: &CustomerRecord) -> String {
    format!("{} {}", record.customer_name, record.combined_address)
}

/// Groups records by `strategy`, flags duplicates and similar addresses, and
/// picks the most complete member of each group as the preferred export.
///
/// Records with no customer name are dropped. Never fails; empty input yields
/// an empty result.
pub fn deduplicate(records: Vec<CustomerRecord>, strategy: KeyStrategy) -> DedupResult {
    let run_id = Uuid::new_v4().to_string();
    let logger = DedupLogger::new(PipelineStage::Dedup);
    logger.log_start(&run_id, &format!("with {} key strategy", strategy));

    let mut stats = DedupStats::new(run_id, Utc::now().naive_utc(), strategy);
    stats.input_records = records.len();

    logger.log_phase("Grouping", Some("computing grouping keys in input order"));
    let mut output: Vec<CustomerRecord> = Vec::with_capacity(records.len());
    let mut key_index: HashMap<String, usize> = HashMap::new();
    let mut key_groups: Vec<(String, Vec<usize>)> = Vec::new();

    for mut record in records {
        if normalize(&record.customer_name).is_empty() {
            stats.skipped_records += 1;
            continue;
        }
        record.is_duplicate = false;
        record.is_similar = false;
        record.is_selectable_duplicate = false;

        let key = grouping_key(&record, strategy);
        let position = output.len();
        match key_index.entry(key) {
            Entry::Occupied(entry) => {
                let members = &mut key_groups[*entry.get()].1;
                let kept = &mut output[members[0]];
                if !source_mentions(&kept.source, &record.source) {
                    kept.source = format!("{}, {}", kept.source, record.source.trim());
                }
                record.is_duplicate = true;
                members.push(position);
            }
            Entry::Vacant(entry) => {
                key_groups.push((entry.key().clone(), vec![position]));
                entry.insert(key_groups.len() - 1);
            }
        }
        output.push(record);
    }

    let groups_with_multiple = key_groups.iter().filter(|(_, m)| m.len() > 1).count();
    logger.log_grouping_complete(output.len(), key_groups.len(), groups_with_multiple);
    logger.log_skipped_rows(stats.skipped_records, "no customer name");

    logger.log_phase("Selecting representatives", Some("scoring address completeness"));
    let mut groups = Vec::with_capacity(groups_with_multiple);
    for (key, members) in key_groups.into_iter().filter(|(_, m)| m.len() > 1) {
        let best = best_candidate(members.iter().map(|&i| &output[i])).unwrap_or(0);
        let best_index = members[best];
        output[best_index].is_selectable_duplicate = true;

        let texts: Vec<String> = members.iter().map(|&i| comparison_text(&output[i])).collect();
        let text_refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let confidence = mean_pairwise_similarity(&text_refs);
        let reasoning = format!(
            "{} records share the {} key; record {} preferred with completeness score {}",
            members.len(),
            strategy,
            best + 1,
            completeness_score(&output[best_index])
        );
        logger.log_debug(&format!("Group '{}': {}", key, reasoning));

        groups.push(DuplicateGroup {
            key,
            canonical_index: members[0],
            member_indices: members,
            confidence,
            reasoning,
        });
    }

    logger.log_phase("Similar addresses", Some("prefix-comparing non-duplicate records"));
    flag_similar_addresses(&mut output);

    logger.log_phase("Sorting", None);
    let (output, groups) = sort_records(output, groups);

    stats.duplicate_records = output.iter().filter(|r| r.is_duplicate).count();
    stats.unique_records = output.len() - stats.duplicate_records;
    stats.groups_with_duplicates = groups.len();
    stats.similar_address_records = output.iter().filter(|r| r.is_similar).count();
    stats.processing_time = logger.elapsed_secs();

    logger.log_completion(&format!(
        "{} unique, {} duplicates in {} groups, {} similar-address records",
        stats.unique_records, stats.duplicate_records, stats.groups_with_duplicates, stats.similar_address_records
    ));

    DedupResult {
        records: output,
        groups,
        stats,
    }
}

/// Flags both records of every non-duplicate pair whose address line 1
/// prefixes agree under the same normalized name.
///
/// Pairs are only compared within a name bucket, since differing names can
/// never match.
pub fn flag_similar_addresses(records: &mut [CustomerRecord]) {
    let mut by_name: HashMap<String, Vec<usize>> = HashMap::new();
    for (i, record) in records.iter().enumerate() {
        if record.is_duplicate || record.address1.trim().is_empty() {
            continue;
        }
        by_name.entry(normalize(&record.customer_name)).or_default().push(i);
    }

    for indices in by_name.values().filter(|v| v.len() > 1) {
        for (pos, &i) in indices.iter().enumerate() {
            for &j in &indices[pos + 1..] {
                if records_look_similar(&records[i], &records[j]) {
                    records[i].is_similar = true;
                    records[j].is_similar = true;
                }
            }
        }
    }
}

fn sort_records(
    records: Vec<CustomerRecord>,
    mut groups: Vec<DuplicateGroup>,
) -> (Vec<CustomerRecord>, Vec<DuplicateGroup>) {
    let mut order: Vec<usize> = (0..records.len()).collect();
    order.sort_by(|&a, &b| {
        locale_compare(&records[a].customer_name, &records[b].customer_name)
            .then_with(|| locale_compare(&records[a].address1, &records[b].address1))
    });

    let mut new_position = vec![0usize; records.len()];
    for (new, &old) in order.iter().enumerate() {
        new_position[old] = new;
    }
    for group in &mut groups {
        group.canonical_index = new_position[group.canonical_index];
        for index in &mut group.member_indices {
            *index = new_position[*index];
        }
    }

    let mut slots: Vec<Option<CustomerRecord>> = records.into_iter().map(Some).collect();
    let sorted: Vec<CustomerRecord> = order
        .iter()
        .filter_map(|&old| slots[old].take())
        .collect();
    (sorted, groups)
}

/// "Customer Names" (first record per company) and "Customer Locations"
/// (every further record of that company).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompanyBuckets {
    pub customer_names: Vec<CustomerRecord>,
    pub customer_locations: Vec<CustomerRecord>,
}

/// Splits records by normalized company name, keeping first-seen company order.
pub fn bucket_by_company(records: &[CustomerRecord]) -> CompanyBuckets {
    let mut companies: Vec<(String, Vec<&CustomerRecord>)> = Vec::new();
    let mut company_index: HashMap<String, usize> = HashMap::new();
    for record in records {
        let name = normalize(&record.customer_name);
        if name.is_empty() {
            continue;
        }
        let idx = *company_index.entry(name.clone()).or_insert_with(|| {
            companies.push((name, Vec::new()));
            companies.len() - 1
        });
        companies[idx].1.push(record);
    }

    let mut buckets = CompanyBuckets::default();
    for (_, company_records) in companies {
        let mut iter = company_records.into_iter();
        if let Some(first) = iter.next() {
            buckets.customer_names.push(first.clone());
        }
        buckets.customer_locations.extend(iter.cloned());
    }
    buckets
}
