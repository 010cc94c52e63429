mod common;

use common::{Article, seeded_executor, xml_children};
use sql_rowmap::params;
use sql_rowmap::prelude::*;
use tokio::runtime::Runtime;

#[test]
fn get_by_id_reports_found() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    let dir = tempfile::tempdir()?;
    rt.block_on(async {
        let engine = Engine::new(seeded_executor(&dir).await?);

        let (found, article) = engine.id(2).get::<Article>().await?;
        assert!(found);
        assert_eq!(article.title, "second");
        assert_eq!(article.userid, 2);
        assert_eq!(article.created.format("%H:%M").to_string(), "12:30");

        let (found, missing) = engine.id(99).get::<Article>().await?;
        assert!(!found);
        assert_eq!(missing, Article::default());
        Ok::<(), SqlRowMapError>(())
    })?;
    Ok(())
}

#[test]
fn get_first_encodes_with_field_layout() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    let dir = tempfile::tempdir()?;
    rt.block_on(async {
        let engine = Engine::new(seeded_executor(&dir).await?);
        let single = engine.id(1).get_first::<Article>().await?;

        let json = single.json()?;
        assert!(json.found);
        assert_eq!(
            json.text,
            r#"{"id":1,"title":"hello","content":"first post","createdatetime":"2024-03-05 00:00","userid":1,"viewcount":10}"#
        );

        let xml = single.xml()?;
        assert!(xml.text.starts_with("<Article><id>1</id><title>hello</title>"));

        let indented = single.xml_indent("", "  ", "article")?;
        assert_eq!(
            indented.text.lines().next(),
            Some("<article>"),
        );
        assert!(indented.text.contains("\n  <createdatetime>2024-03-05 00:00</createdatetime>"));

        let none = engine.id(42).get_first::<Article>().await?.json()?;
        assert!(!none.found);
        Ok::<(), SqlRowMapError>(())
    })?;
    Ok(())
}

#[test]
fn find_with_filters_and_raw_sql() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    let dir = tempfile::tempdir()?;
    rt.block_on(async {
        let engine = Engine::new(seeded_executor(&dir).await?);

        let mine = engine
            .filter("userid = ?", vec![1.into()])
            .filter("viewcount < ?", vec![100.into()])
            .find::<Article>()
            .await?;
        let ids: Vec<i64> = mine.items.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![1, 4]);
        assert_eq!(mine.items[1].content, None);

        let raw = engine
            .sql("select * from article where id > ? order by id", vec![1.into()])
            .find::<Article>()
            .await?;
        assert_eq!(raw.items.len(), 2);

        let xml = raw.xml()?;
        assert!(xml.starts_with("<rows><Article>"));
        assert_eq!(xml.matches("</Article>").count(), 2);

        let empty = engine.filter("id < ?", vec![0.into()]).find::<Article>().await?;
        assert!(empty.items.is_empty());
        assert_eq!(empty.json()?, "[]");
        Ok::<(), SqlRowMapError>(())
    })?;
    Ok(())
}

#[test]
fn generic_query_keeps_native_types() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    let dir = tempfile::tempdir()?;
    rt.block_on(async {
        let engine = Engine::new(seeded_executor(&dir).await?);
        let result = engine
            .sql("select * from article where id = ?", vec![4.into()])
            .query()
            .await?;

        assert_eq!(result.rows().len(), 1);
        let row = &result[0];
        assert_eq!(row["id"], RowValues::Int(4));
        assert_eq!(row["title"], RowValues::Text("fourth".into()));
        assert_eq!(row["content"], RowValues::Null);
        assert_eq!(row["published"], RowValues::Bool(true));
        assert_eq!(row["rating"], RowValues::Null);
        assert!(matches!(row["createdatetime"], RowValues::Timestamp(_)));

        let json = result.json()?;
        assert!(json.starts_with(r#"[{"id":4,"title":"fourth","content":null"#));
        assert!(json.contains(r#""createdatetime":"2024-03-05T08:15:00""#));
        Ok::<(), SqlRowMapError>(())
    })?;
    Ok(())
}

#[test]
fn param_map_with_date_format() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    let dir = tempfile::tempdir()?;
    rt.block_on(async {
        let engine = Engine::new(seeded_executor(&dir).await?);
        let sql = "select id,title,createdatetime,content from article where id = ?id and userid=?userid";

        let by_example = engine
            .sql(sql, params! { "userid" => 1, "id" => 4 })
            .query_with_date_format("20060102")
            .await?
            .json()?;
        assert_eq!(
            by_example,
            r#"[{"id":4,"title":"fourth","createdatetime":"20240305","content":null}]"#
        );

        let by_tokens = engine
            .sql(sql, params! { "id" => 1, "userid" => 1 })
            .query_with_date_format("YYYYMMDD")
            .await?;
        assert_eq!(
            by_tokens[0]["createdatetime"],
            RowValues::Text("20240305".into())
        );

        let plain = engine
            .sql(sql, params! { "id" => 1, "userid" => 1 })
            .query()
            .await?;
        assert!(plain.xml()?.contains("<createdatetime>2024-03-05T00:00:00</createdatetime>"));
        Ok::<(), SqlRowMapError>(())
    })?;
    Ok(())
}

#[test]
fn indented_xml_has_one_element_per_row() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    let dir = tempfile::tempdir()?;
    let (xml, row_count) = rt.block_on(async {
        let engine = Engine::new(seeded_executor(&dir).await?);
        let result = engine.table("article").query().await?;
        let xml = result.xml_indent("", "\t", "article")?;
        assert_eq!(xml, result.xml_indent("", "\t", "article")?);
        Ok::<_, SqlRowMapError>((xml, result.rows().len()))
    })?;

    let (root, children) = xml_children(&xml)?;
    assert_eq!(root, "rows");
    assert_eq!(children.len(), row_count);
    assert!(children.iter().all(|name| name == "article"));
    assert_eq!(xml.matches("\n\t<article>").count(), 3);
    Ok(())
}

#[test]
fn bind_errors_surface_to_caller() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    let dir = tempfile::tempdir()?;
    rt.block_on(async {
        let engine = Engine::new(seeded_executor(&dir).await?);

        let missing_key = engine
            .sql("select * from article where id = ?id and userid = ?userid", params! { "id" => 1 })
            .query()
            .await;
        assert!(matches!(missing_key, Err(SqlRowMapError::BindError(_))));

        let count = engine
            .sql("select * from article where id = ?", Vec::<RowValues>::new())
            .query()
            .await;
        assert!(matches!(count, Err(SqlRowMapError::BindError(_))));

        let bad_sql = engine.sql("select * from nowhere", ()).query().await;
        assert!(matches!(bad_sql, Err(SqlRowMapError::ExecutionError(_))));
        Ok::<(), SqlRowMapError>(())
    })?;
    Ok(())
}

#[test]
fn concurrent_chains_share_one_engine() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    let dir = tempfile::tempdir()?;
    rt.block_on(async {
        let engine = Engine::new(seeded_executor(&dir).await?);
        let (a, b, c) = tokio::join!(
            engine.id(1).get::<Article>(),
            engine.id(2).get::<Article>(),
            engine.filter("userid = ?", vec![1.into()]).find::<Article>(),
        );
        assert_eq!(a?.1.title, "hello");
        assert_eq!(b?.1.title, "second");
        assert_eq!(c?.items.len(), 2);

        let shared = engine.clone();
        let handle = tokio::spawn(async move {
            shared.id(4).get::<Article>().await.map(|(found, _)| found)
        });
        assert!(handle.await.map_err(SqlRowMapError::from)??);
        Ok::<(), SqlRowMapError>(())
    })?;
    Ok(())
}
