/// Stable output field a raw column may be mapped onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    Club,
    League,
    ValueOnDate,
    CurrentValue,
    PctChange,
}

impl ColumnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnRole::Club => "club",
            ColumnRole::League => "league",
            ColumnRole::ValueOnDate => "value_on_date",
            ColumnRole::CurrentValue => "current_value",
            ColumnRole::PctChange => "pct_change",
        }
    }
}

/// Raw header labels resolved for each role, for one table.
///
/// Resolution is table-wide: the same labels apply to every row. `club`
/// always resolves (otherwise the run aborts), the rest are optional and
/// simply absent from the output when unresolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedColumns {
    pub club: String,
    pub league: Option<String>,
    pub value_on_date: Option<String>,
    pub current_value: Option<String>,
    pub pct_change: Option<String>,
}

impl ResolvedColumns {
    /// (role, raw label) pairs in output column order.
    pub fn in_order(&self) -> Vec<(ColumnRole, &str)> {
        let mut pairs = vec![(ColumnRole::Club, self.club.as_str())];
        if let Some(label) = &self.league {
            pairs.push((ColumnRole::League, label));
        }
        if let Some(label) = &self.value_on_date {
            pairs.push((ColumnRole::ValueOnDate, label));
        }
        if let Some(label) = &self.current_value {
            pairs.push((ColumnRole::CurrentValue, label));
        }
        if let Some(label) = &self.pct_change {
            pairs.push((ColumnRole::PctChange, label));
        }
        pairs
    }
}
