//! Column definitions and their fluent modifiers.

/// Column type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// 1-byte integer.
    TinyInteger,
    /// 2-byte integer.
    SmallInteger,
    /// 4-byte integer.
    Integer,
    /// 8-byte integer.
    BigInteger,
    /// Variable-length string with a maximum length.
    String(u32),
    /// Fixed-length string.
    Char(u32),
    /// Text.
    Text,
    /// Medium text (MySQL).
    MediumText,
    /// Long text (MySQL).
    LongText,
    /// Boolean.
    Boolean,
    /// Exact decimal with precision and scale.
    Decimal(u8, u8),
    /// Single-precision float.
    Float,
    /// Double-precision float.
    Double,
    /// Date.
    Date,
    /// Date and time, with fractional-second precision.
    DateTime(Option<u8>),
    /// Time of day.
    Time,
    /// Timestamp, with fractional-second precision.
    Timestamp(Option<u8>),
    /// JSON document.
    Json,
    /// Binary data.
    Binary,
    /// UUID.
    Uuid,
}

impl ColumnType {
    /// Whether the type is one of the integer types.
    #[must_use]
    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            Self::TinyInteger | Self::SmallInteger | Self::Integer | Self::BigInteger
        )
    }
}

/// Default value for a column.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    /// NULL default.
    Null,
    /// Boolean default; rendered per dialect.
    Boolean(bool),
    /// Integer default.
    Integer(i64),
    /// Float default.
    Float(f64),
    /// String default.
    String(String),
    /// Raw SQL expression (e.g., `CURRENT_TIMESTAMP`).
    Expression(String),
}

/// Conversion into a [`DefaultValue`].
pub trait IntoDefault {
    /// Converts the value.
    fn into_default(self) -> DefaultValue;
}

impl IntoDefault for DefaultValue {
    fn into_default(self) -> DefaultValue {
        self
    }
}

impl IntoDefault for bool {
    fn into_default(self) -> DefaultValue {
        DefaultValue::Boolean(self)
    }
}

impl IntoDefault for i64 {
    fn into_default(self) -> DefaultValue {
        DefaultValue::Integer(self)
    }
}

impl IntoDefault for i32 {
    fn into_default(self) -> DefaultValue {
        DefaultValue::Integer(i64::from(self))
    }
}

impl IntoDefault for f64 {
    fn into_default(self) -> DefaultValue {
        DefaultValue::Float(self)
    }
}

impl IntoDefault for &str {
    fn into_default(self) -> DefaultValue {
        DefaultValue::String(String::from(self))
    }
}

impl IntoDefault for String {
    fn into_default(self) -> DefaultValue {
        DefaultValue::String(self)
    }
}

/// A generated column expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generated {
    /// SQL expression.
    pub expression: String,
    /// `STORED` when set, `VIRTUAL` otherwise.
    pub stored: bool,
}

/// A column and its modifiers.
///
/// Index markers (`primary`, `unique`, `index`) hold `Some(None)` for a
/// generated index name and `Some(Some(name))` for an explicit one. They are
/// turned into table commands before compilation.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    /// Column name.
    pub name: String,
    /// Type tag.
    pub column_type: ColumnType,
    /// Whether NULL is allowed.
    pub nullable: bool,
    /// Default value.
    pub default: Option<DefaultValue>,
    /// Unsigned integer (MySQL).
    pub unsigned: bool,
    /// Auto-increment primary key.
    pub auto_increment: bool,
    /// Inline primary-key marker.
    pub primary: Option<Option<String>>,
    /// Inline unique-index marker.
    pub unique: Option<Option<String>>,
    /// Inline plain-index marker.
    pub index: Option<Option<String>>,
    /// Generated column expression.
    pub generated: Option<Generated>,
    /// Collation.
    pub collation: Option<String>,
    /// Column comment.
    pub comment: Option<String>,
    /// Modify an existing column instead of adding one.
    pub change: bool,
}

impl ColumnDefinition {
    /// Creates a NOT NULL column without modifiers.
    #[must_use]
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: false,
            default: None,
            unsigned: false,
            auto_increment: false,
            primary: None,
            unique: None,
            index: None,
            generated: None,
            collation: None,
            comment: None,
            change: false,
        }
    }

    /// Allows NULL.
    pub fn nullable(&mut self) -> &mut Self {
        self.nullable = true;
        self
    }

    /// Sets the default value.
    pub fn default(&mut self, value: impl IntoDefault) -> &mut Self {
        self.default = Some(value.into_default());
        self
    }

    /// Defaults to `CURRENT_TIMESTAMP`.
    pub fn use_current(&mut self) -> &mut Self {
        self.default = Some(DefaultValue::Expression(String::from("CURRENT_TIMESTAMP")));
        self
    }

    /// Marks an integer column unsigned.
    pub fn unsigned(&mut self) -> &mut Self {
        self.unsigned = true;
        self
    }

    /// Makes the column an auto-increment primary key.
    pub fn auto_increment(&mut self) -> &mut Self {
        self.auto_increment = true;
        self
    }

    /// Adds a primary key on this column.
    pub fn primary(&mut self) -> &mut Self {
        self.primary = Some(None);
        self
    }

    /// Adds a unique index on this column.
    pub fn unique(&mut self) -> &mut Self {
        self.unique = Some(None);
        self
    }

    /// Adds a named unique index on this column.
    pub fn unique_named(&mut self, name: &str) -> &mut Self {
        self.unique = Some(Some(String::from(name)));
        self
    }

    /// Adds an index on this column.
    pub fn index(&mut self) -> &mut Self {
        self.index = Some(None);
        self
    }

    /// Adds a named index on this column.
    pub fn index_named(&mut self, name: &str) -> &mut Self {
        self.index = Some(Some(String::from(name)));
        self
    }

    /// Computes the value from `expression` and stores it.
    pub fn stored_as(&mut self, expression: &str) -> &mut Self {
        self.generated = Some(Generated {
            expression: String::from(expression),
            stored: true,
        });
        self
    }

    /// Computes the value from `expression` on read.
    pub fn virtual_as(&mut self, expression: &str) -> &mut Self {
        self.generated = Some(Generated {
            expression: String::from(expression),
            stored: false,
        });
        self
    }

    /// Sets the collation.
    pub fn collation(&mut self, collation: &str) -> &mut Self {
        self.collation = Some(String::from(collation));
        self
    }

    /// Sets a column comment.
    pub fn comment(&mut self, comment: &str) -> &mut Self {
        self.comment = Some(String::from(comment));
        self
    }

    /// Modifies the existing column rather than adding it.
    pub fn change(&mut self) -> &mut Self {
        self.change = true;
        self
    }
}

/// Foreign key referential action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForeignKeyAction {
    /// No action.
    NoAction,
    /// Restrict deletion/update.
    Restrict,
    /// Cascade the operation.
    Cascade,
    /// Set to NULL.
    SetNull,
    /// Set to default value.
    SetDefault,
}

impl ForeignKeyAction {
    /// Returns the SQL representation of the action.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::NoAction => "NO ACTION",
            Self::Restrict => "RESTRICT",
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
        }
    }
}
