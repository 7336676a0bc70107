use rusqlite::Connection;

use crate::db::{Collection, DatabaseError, Filter, FindOptions, IndexSpec, Sort, UpdateOps};
use crate::models::{now, Faq, News, Resource};

pub(super) const INDEXES: &[IndexSpec] = &[
    IndexSpec::new("resources", "display_order"),
    IndexSpec::new("news", "date"),
];

// ═══════════════════════════════════════════
// Resources
// ═══════════════════════════════════════════

pub fn find_resources(conn: &Connection) -> Result<Vec<Resource>, DatabaseError> {
    super::find_many(conn, &Filter::All, &FindOptions::sorted(Sort::asc("display_order")))
}

/// Rewrite `display_order` so resources appear in the order of `ids`.
/// Unknown ids fail with `NotFound`; resources not listed keep their order.
pub fn reorder_resources(conn: &Connection, ids: &[String]) -> Result<(), DatabaseError> {
    let resources = Collection::<Resource>::new();
    let stamp = now().timestamp_millis();
    for (position, id) in ids.iter().enumerate() {
        let update = UpdateOps::new()
            .set("display_order", position as i64)
            .set("date_updated", stamp);
        if resources.update_one(conn, &Filter::id(id), &update)? == 0 {
            return Err(DatabaseError::not_found("Resource", id));
        }
    }
    Ok(())
}

// ═══════════════════════════════════════════
// FAQ
// ═══════════════════════════════════════════

/// The FAQ document, if one has been stored.
pub fn find_faq(conn: &Connection) -> Result<Option<Faq>, DatabaseError> {
    super::find_one(conn, &Filter::All)
}

/// Replace the FAQ, creating it on first write. Sections and questions are
/// stored sorted by their display order.
pub fn save_faq(conn: &Connection, mut faq: Faq) -> Result<Faq, DatabaseError> {
    faq.sections.sort_by_key(|s| s.display_order);
    for section in &mut faq.sections {
        section.questions.sort_by_key(|q| q.display_order);
    }
    match find_faq(conn)? {
        Some(existing) => {
            faq.id = existing.id;
            faq.date_created = existing.date_created;
            super::save(conn, &mut faq)?;
            Ok(faq)
        }
        None => super::create(conn, faq),
    }
}

// ═══════════════════════════════════════════
// News
// ═══════════════════════════════════════════

/// News items newest first, optionally capped at `limit`.
pub fn find_news(conn: &Connection, limit: Option<u32>) -> Result<Vec<News>, DatabaseError> {
    let mut options = FindOptions::sorted(Sort::desc("date"));
    options.limit = limit;
    super::find_many(conn, &Filter::All, &options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::create;
    use crate::db::sqlite::open_memory_database;
    use crate::models::{FaqQuestion, FaqSection};
    use chrono::{DateTime, Duration, Utc};

    #[test]
    fn reorder_follows_given_ids() {
        let conn = open_memory_database().unwrap();
        let a = create(&conn, Resource::new("A", "https://a", 0)).unwrap();
        let b = create(&conn, Resource::new("B", "https://b", 1)).unwrap();
        let c = create(&conn, Resource::new("C", "https://c", 2)).unwrap();

        reorder_resources(&conn, &[c.id.clone(), a.id.clone(), b.id.clone()]).unwrap();
        let titles: Vec<String> = find_resources(&conn).unwrap().into_iter().map(|r| r.title).collect();
        assert_eq!(titles, vec!["C", "A", "B"]);

        assert!(reorder_resources(&conn, &["missing".into()]).unwrap_err().is_not_found());
    }

    #[test]
    fn faq_is_a_single_document() {
        let conn = open_memory_database().unwrap();
        assert!(find_faq(&conn).unwrap().is_none());
        let faq = Faq {
            id: String::new(),
            sections: vec![
                FaqSection { title: "Later".into(), display_order: 2, questions: vec![] },
                FaqSection {
                    title: "First".into(),
                    display_order: 1,
                    questions: vec![
                        FaqQuestion { title: "q2".into(), description: "d".into(), display_order: 2 },
                        FaqQuestion { title: "q1".into(), description: "d".into(), display_order: 1 },
                    ],
                },
            ],
            date_created: DateTime::<Utc>::UNIX_EPOCH,
            date_updated: None,
        };
        let first = save_faq(&conn, faq.clone()).unwrap();
        let second = save_faq(&conn, faq).unwrap();
        assert_eq!(first.id, second.id);

        let stored = find_faq(&conn).unwrap().unwrap();
        assert_eq!(stored.sections[0].title, "First");
        assert_eq!(stored.sections[0].questions[0].title, "q1");
        assert_eq!(conn.query_row("SELECT COUNT(*) FROM faq", [], |r| r.get::<_, i64>(0)).unwrap(), 1);
    }

    #[test]
    fn news_newest_first_with_limit() {
        let conn = open_memory_database().unwrap();
        let t = now();
        create(&conn, News::new(t - Duration::days(2), "old", "d")).unwrap();
        create(&conn, News::new(t, "new", "d")).unwrap();
        create(&conn, News::new(t - Duration::days(1), "mid", "d")).unwrap();

        let titles: Vec<String> = find_news(&conn, Some(2)).unwrap().into_iter().map(|n| n.title).collect();
        assert_eq!(titles, vec!["new", "mid"]);
        assert_eq!(find_news(&conn, None).unwrap().len(), 3);
    }
}
