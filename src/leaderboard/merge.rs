use std::collections::HashMap;

use super::errors::LeaderboardError;
use super::models::{BonusInviteTally, CodeInviteTally, LeaderboardEntry};

/// Folds the code and bonus tallies into one merged record per member.
///
/// Two passes: seed an entry per inviter from the code tallies, then fold the
/// bonus tallies in, adding to an existing entry or creating a new one.
/// Either source may introduce a member the other does not mention, which is
/// why a single pass cannot work. A bonus tally that has to create a new
/// entry but carries no resolvable name is a referential inconsistency in
/// the data source and fails the whole merge.
pub fn merge_tallies(
    code_tallies: &[CodeInviteTally],
    bonus_tallies: &[BonusInviteTally],
) -> Result<HashMap<String, LeaderboardEntry>, LeaderboardError> {
    let mut entries: HashMap<String, LeaderboardEntry> =
        HashMap::with_capacity(code_tallies.len());

    for tally in code_tallies {
        let entry = entries
            .entry(tally.inviter_id.clone())
            .or_insert_with(|| LeaderboardEntry {
                member_id: tally.inviter_id.clone(),
                name: tally.inviter_name.clone(),
                code_credit: 0,
                bonus_credit: 0,
                recent_joins: 0,
            });
        entry.code_credit += i64::from(tally.total_uses);
    }

    for tally in bonus_tallies {
        match entries.get_mut(&tally.member_id) {
            Some(entry) => {
                entry.bonus_credit += i64::from(tally.total_amount);
            }
            None => {
                let name = tally.member_name.clone().ok_or_else(|| {
                    LeaderboardError::OrphanMember {
                        member_id: tally.member_id.clone(),
                    }
                })?;
                entries.insert(
                    tally.member_id.clone(),
                    LeaderboardEntry {
                        member_id: tally.member_id.clone(),
                        name,
                        code_credit: 0,
                        bonus_credit: i64::from(tally.total_amount),
                        recent_joins: 0,
                    },
                );
            }
        }
    }

    Ok(entries)
}
