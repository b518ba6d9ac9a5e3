//! Query templates. `%PREFIX%` is replaced by the configured table prefix
//! once, when a store is built.

/// Substituted with the table prefix.
const PREFIX_PLACEHOLDER: &str = "%PREFIX%";

const GET_MESSAGE: &str = r#"
    SELECT MESSAGE_ID, CREATED_DATE, MESSAGE_BYTES
    FROM %PREFIX%MESSAGE
    WHERE MESSAGE_ID = ?1 AND REGION = ?2
"#;

const DELETE_MESSAGE: &str = r#"
    DELETE FROM %PREFIX%MESSAGE
    WHERE MESSAGE_ID = ?1 AND REGION = ?2
"#;

const CREATE_MESSAGE: &str = r#"
    INSERT INTO %PREFIX%MESSAGE (MESSAGE_ID, REGION, CREATED_DATE, MESSAGE_BYTES)
    VALUES (?1, ?2, ?3, ?4)
"#;

const COUNT_MESSAGES: &str = r#"
    SELECT COUNT(*)
    FROM %PREFIX%MESSAGE
    WHERE REGION = ?1
"#;

// ROWID breaks ties between members created within the same milli-second
const LIST_UNMARKED_MESSAGES_BY_GROUP_KEY: &str = r#"
    SELECT MESSAGE_ID, CREATED_DATE, GROUP_KEY, MESSAGE_BYTES
    FROM %PREFIX%MESSAGE_GROUP
    WHERE GROUP_KEY = ?1 AND REGION = ?2 AND MARKED = 0
    ORDER BY CREATED_DATE, ROWID
"#;

const LIST_MARKED_MESSAGES_BY_GROUP_KEY: &str = r#"
    SELECT MESSAGE_ID, CREATED_DATE, GROUP_KEY, MESSAGE_BYTES
    FROM %PREFIX%MESSAGE_GROUP
    WHERE GROUP_KEY = ?1 AND REGION = ?2 AND MARKED = 1
"#;

const GET_MIN_CREATED_DATE_BY_GROUP_KEY: &str = r#"
    SELECT MIN(CREATED_DATE) AS CREATED_DATE
    FROM %PREFIX%MESSAGE_GROUP
    WHERE GROUP_KEY = ?1 AND REGION = ?2
"#;

const MARK_MESSAGES_IN_GROUP: &str = r#"
    UPDATE %PREFIX%MESSAGE_GROUP
    SET UPDATED_DATE = ?1, MARKED = 1
    WHERE MARKED = 0 AND GROUP_KEY = ?2 AND REGION = ?3
"#;

const MARK_MESSAGE_IN_GROUP: &str = r#"
    UPDATE %PREFIX%MESSAGE_GROUP
    SET UPDATED_DATE = ?1, MARKED = 1
    WHERE MESSAGE_ID = ?2 AND MARKED = 0 AND GROUP_KEY = ?3 AND REGION = ?4
"#;

const REMOVE_MESSAGE_FROM_GROUP: &str = r#"
    DELETE FROM %PREFIX%MESSAGE_GROUP
    WHERE GROUP_KEY = ?1 AND REGION = ?2 AND MESSAGE_ID = ?3
"#;

const DELETE_MESSAGE_GROUP: &str = r#"
    DELETE FROM %PREFIX%MESSAGE_GROUP
    WHERE GROUP_KEY = ?1 AND REGION = ?2
"#;

const CREATE_MESSAGE_IN_GROUP: &str = r#"
    INSERT INTO %PREFIX%MESSAGE_GROUP (MESSAGE_ID, REGION, CREATED_DATE, GROUP_KEY, MARKED, MESSAGE_BYTES)
    VALUES (?1, ?2, ?3, ?4, 0, ?5)
"#;

const LIST_GROUP_KEYS: &str = r#"
    SELECT DISTINCT GROUP_KEY
    FROM %PREFIX%MESSAGE_GROUP
    WHERE REGION = ?1
"#;

const COUNT_GROUPS: &str = r#"
    SELECT COUNT(DISTINCT GROUP_KEY)
    FROM %PREFIX%MESSAGE_GROUP
    WHERE REGION = ?1
"#;

/// Every statement a store issues, rendered for one table prefix.
#[derive(Debug)]
pub(super) struct Queries {
    pub get_message: String,
    pub delete_message: String,
    pub create_message: String,
    pub count_messages: String,
    pub list_unmarked: String,
    pub list_marked: String,
    pub min_created_date: String,
    pub mark_group: String,
    pub mark_message: String,
    pub remove_from_group: String,
    pub delete_group: String,
    pub add_to_group: String,
    pub list_group_keys: String,
    pub count_groups: String,
}

impl Queries {
    pub fn new(table_prefix: &str) -> Self {
        let render = |base: &str| base.replace(PREFIX_PLACEHOLDER, table_prefix);
        Self {
            get_message: render(GET_MESSAGE),
            delete_message: render(DELETE_MESSAGE),
            create_message: render(CREATE_MESSAGE),
            count_messages: render(COUNT_MESSAGES),
            list_unmarked: render(LIST_UNMARKED_MESSAGES_BY_GROUP_KEY),
            list_marked: render(LIST_MARKED_MESSAGES_BY_GROUP_KEY),
            min_created_date: render(GET_MIN_CREATED_DATE_BY_GROUP_KEY),
            mark_group: render(MARK_MESSAGES_IN_GROUP),
            mark_message: render(MARK_MESSAGE_IN_GROUP),
            remove_from_group: render(REMOVE_MESSAGE_FROM_GROUP),
            delete_group: render(DELETE_MESSAGE_GROUP),
            add_to_group: render(CREATE_MESSAGE_IN_GROUP),
            list_group_keys: render(LIST_GROUP_KEYS),
            count_groups: render(COUNT_GROUPS),
        }
    }
}
