pub(crate) mod embeds;
pub(crate) mod leaderboard;
pub(crate) mod levelnotifs;
pub(crate) mod rank;
pub(crate) mod setxp;

use rusqlite::Result as SqlResult;

use crate::utils::{database::Database, xp};
use embeds::Standing;

/// Rank and level for a user holding `total_xp`.
pub fn standing(database: &Database, total_xp: u64) -> SqlResult<Standing> {
    Ok(Standing {
        rank: database.rank_for_xp(total_xp)?,
        xp: total_xp,
        level: xp::level_info(total_xp),
    })
}
