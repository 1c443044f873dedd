//! Page-independent layout model of a member card.
//!
//! Building the layout is pure: the same member, lodge name and issue date
//! always produce an equal [`CardLayout`]. The PDF writer only turns blocks
//! into drawing operations.

use chrono::NaiveDate;

use crate::models::{normalize_rank_label, FinancialStatus, Member, MemberField, MemberStatus, Rank};

/// Rendered in place of a missing or blank value.
pub const PLACEHOLDER: &str = "—";

pub const CARD_TITLE: &str = "ΚΑΡΤΕΛΑ ΜΕΛΟΥΣ";

/// Label and value column widths in millimetres.
pub const TABLE_COLUMNS_MM: [f32; 2] = [50.0, 100.0];
const SIGNATURE_COLUMNS_MM: [f32; 2] = [60.0, 90.0];

pub const ISSUE_DATE_LABEL: &str = "Ημερομηνία Έκδοσης:";
const SIGNATURE_LABEL: &str = "Γραμματεύς-Σφραγιδοφύλαξ:";
const SIGNATURE_LINE: &str = "_____________________";

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub rows: Vec<(String, String)>,
    pub column_widths: [f32; 2],
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Title(String),
    RegistryNumber(String),
    Heading(String),
    Table(Table),
    Paragraph(String),
    /// Vertical gap in millimetres.
    Spacer(f32),
    PageBreak,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CardLayout {
    pub blocks: Vec<Block>,
}

/// Lay out the card for one member.
pub fn build_card(member: &Member, lodge_name: &str, issue_date: NaiveDate) -> CardLayout {
    let mut blocks = vec![
        Block::Title(CARD_TITLE.to_string()),
        Block::Title(lodge_name.to_string()),
        Block::Spacer(6.0),
        Block::RegistryNumber(format!(
            "Αριθμός Μητρώου (Στοάς): {}",
            value(member, MemberField::LodgeRegNo)
        )),
        Block::RegistryNumber(format!(
            "Αριθμός Μητρώου (Μεγάλης Στοάς): {}",
            value(member, MemberField::GrandLodgeRegNo)
        )),
        Block::Spacer(8.0),
    ];

    section(
        &mut blocks,
        "ΠΡΟΣΩΠΙΚΑ ΣΤΟΙΧΕΙΑ",
        vec![
            row("Επώνυμο:", value(member, MemberField::LastName)),
            row("Όνομα:", value(member, MemberField::FirstName)),
            row("Πατρώνυμο:", value(member, MemberField::FathersName)),
            row("Ημ/νία Γέννησης:", value(member, MemberField::BirthDate)),
            row("Τόπος Γέννησης:", value(member, MemberField::BirthPlace)),
            row("Επάγγελμα:", value(member, MemberField::Profession)),
            row(
                "ΑΦΜ:",
                value_or_fallback(member, MemberField::TaxId, MemberField::Afm),
            ),
            row("Αρ. Ταυτότητας:", value(member, MemberField::IdNumber)),
        ],
    );

    section(
        &mut blocks,
        "ΣΤΟΙΧΕΙΑ ΕΠΙΚΟΙΝΩΝΙΑΣ",
        vec![
            row("Διεύθυνση:", value(member, MemberField::Address)),
            row("ΤΚ:", value(member, MemberField::PostalCode)),
            row("Πόλη:", value(member, MemberField::City)),
            row("Τηλ. Οικίας:", value(member, MemberField::HomePhone)),
            row("Κινητό:", value(member, MemberField::MobilePhone)),
            row("E-mail:", value(member, MemberField::Email)),
        ],
    );

    let rank = text(member, MemberField::CurrentDegree)
        .map(normalize_rank_label)
        .unwrap_or_else(|| Rank::Apprentice.as_str().to_string());
    let initiation_lodge = text(member, MemberField::InitiationLodge)
        .unwrap_or(lodge_name)
        .to_string();

    section(
        &mut blocks,
        "ΣΤΟΙΧΕΙΑ ΜΕΓΑΛΗΣ ΣΤΟΑΣ",
        vec![
            row("Ημ/νία Μύησης:", value(member, MemberField::InitiationDate)),
            row(
                "Αρ. Διπλ. Μύησης:",
                value(member, MemberField::InitiationDiploma),
            ),
            row(
                "Ημ/νία 2ου Βαθμού:",
                value(member, MemberField::SecondDegreeDate),
            ),
            row(
                "Αρ. Διπλ. 2ου:",
                value(member, MemberField::SecondDegreeDiploma),
            ),
            row(
                "Ημ/νία 3ου Βαθμού:",
                value(member, MemberField::ThirdDegreeDate),
            ),
            row(
                "Αρ. Διπλ. 3ου:",
                value(member, MemberField::ThirdDegreeDiploma),
            ),
            row("Τρέχων Βαθμός:", rank),
            row("Στοά Μύησης:", initiation_lodge),
            row(
                "Αρ. Στοάς:",
                value(member, MemberField::InitiationLodgeNumber),
            ),
            row("Εισηγητής:", value(member, MemberField::Sponsor)),
        ],
    );

    blocks.push(Block::PageBreak);

    section(
        &mut blocks,
        "ΙΣΤΟΡΙΚΟ ΣΤΟΑΣ",
        vec![
            row("Ημ/νία Εισόδου:", value(member, MemberField::EntryDate)),
            row("Αξιώματα:", value(member, MemberField::OfficesHeld)),
            row("Παράσημα:", value(member, MemberField::Honors)),
            row("Επιτροπές:", value(member, MemberField::Committees)),
        ],
    );

    section(
        &mut blocks,
        "ΟΙΚΟΓΕΝΕΙΑΚΑ ΣΤΟΙΧΕΙΑ",
        vec![
            row("Οικογ. Κατάσταση:", value(member, MemberField::MaritalStatus)),
            row("Όνομα Συζύγου:", value(member, MemberField::SpouseName)),
            row("Ονόματα Τέκνων:", value(member, MemberField::ChildrenNames)),
            row("Επείγον Τηλ.:", value(member, MemberField::EmergencyPhone)),
            row(
                "Επαφή Έκτ. Ανάγκης:",
                value_or_fallback(
                    member,
                    MemberField::EmergencyContact,
                    MemberField::EmergencyContactName,
                ),
            ),
        ],
    );

    section(
        &mut blocks,
        "ΔΙΟΙΚΗΤΙΚΑ ΣΤΟΙΧΕΙΑ",
        vec![
            row(
                "Κατάσταση Μέλους:",
                text(member, MemberField::MemberStatus)
                    .unwrap_or(MemberStatus::Active.as_str())
                    .to_string(),
            ),
            row(
                "Ημ/νία Αλλαγής:",
                value(member, MemberField::StatusChangeDate),
            ),
            row(
                "Λόγος Αλλαγής:",
                value(member, MemberField::StatusChangeReason),
            ),
            row(
                "Οικον. Τακτοποίηση:",
                text(member, MemberField::FinancialStatus)
                    .unwrap_or(FinancialStatus::Paid.as_str())
                    .to_string(),
            ),
            row("Τελ. Πληρωμή:", value(member, MemberField::LastPaymentDate)),
        ],
    );

    if let Some(notes) = text(member, MemberField::Notes) {
        blocks.push(Block::Heading("ΠΑΡΑΤΗΡΗΣΕΙΣ".to_string()));
        blocks.push(Block::Paragraph(notes.to_string()));
        blocks.push(Block::Spacer(5.0));
    }

    blocks.push(Block::Spacer(10.0));
    blocks.push(Block::Table(Table {
        rows: vec![
            row(
                ISSUE_DATE_LABEL,
                issue_date.format("%d/%m/%Y").to_string(),
            ),
            row(SIGNATURE_LABEL, SIGNATURE_LINE.to_string()),
        ],
        column_widths: SIGNATURE_COLUMNS_MM,
    }));

    CardLayout { blocks }
}

fn section(blocks: &mut Vec<Block>, heading: &str, rows: Vec<(String, String)>) {
    blocks.push(Block::Heading(heading.to_string()));
    blocks.push(Block::Table(Table {
        rows,
        column_widths: TABLE_COLUMNS_MM,
    }));
    blocks.push(Block::Spacer(5.0));
}

fn row(label: &str, value: String) -> (String, String) {
    (label.to_string(), value)
}

/// Non-blank stored text of a field.
fn text(member: &Member, field: MemberField) -> Option<&str> {
    member.get(field).map(str::trim).filter(|v| !v.is_empty())
}

fn value(member: &Member, field: MemberField) -> String {
    text(member, field).unwrap_or(PLACEHOLDER).to_string()
}

fn value_or_fallback(member: &Member, primary: MemberField, fallback: MemberField) -> String {
    text(member, primary)
        .or_else(|| text(member, fallback))
        .unwrap_or(PLACEHOLDER)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DEPRECATED_MASTER_LABEL;

    const LODGE: &str = "ΑΚΡΟΠΟΛΙΣ Υπ ΑΡΙΘΜ 84";

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn member() -> Member {
        let mut member = Member {
            member_id: 7,
            ..Member::default()
        };
        member.set(MemberField::LastName, Some("Καραγιάννης".into()));
        member.set(MemberField::FirstName, Some("Νικόλαος".into()));
        member.set(MemberField::LodgeRegNo, Some("112".into()));
        member.set(MemberField::GrandLodgeRegNo, Some("9031".into()));
        member.set(MemberField::CurrentDegree, Some(DEPRECATED_MASTER_LABEL.into()));
        member
    }

    fn table_value<'a>(layout: &'a CardLayout, label: &str) -> Option<&'a str> {
        layout.blocks.iter().find_map(|block| match block {
            Block::Table(table) => table
                .rows
                .iter()
                .find(|(l, _)| l == label)
                .map(|(_, v)| v.as_str()),
            _ => None,
        })
    }

    fn has_block(layout: &CardLayout, wanted: &Block) -> bool {
        layout.blocks.iter().any(|block| block == wanted)
    }

    #[test]
    fn test_deprecated_rank_renders_canonical() {
        let layout = build_card(&member(), LODGE, date(2026, 1, 15));
        assert_eq!(table_value(&layout, "Τρέχων Βαθμός:"), Some("Διδάσκαλος"));
    }

    #[test]
    fn test_registry_lines_never_show_row_id() {
        let layout = build_card(&member(), LODGE, date(2026, 1, 15));
        assert!(has_block(
            &layout,
            &Block::RegistryNumber("Αριθμός Μητρώου (Στοάς): 112".into())
        ));
        assert!(has_block(
            &layout,
            &Block::RegistryNumber("Αριθμός Μητρώου (Μεγάλης Στοάς): 9031".into())
        ));

        let mut unnumbered = member();
        unnumbered.lodge_reg_no = None;
        let layout = build_card(&unnumbered, LODGE, date(2026, 1, 15));
        assert!(has_block(
            &layout,
            &Block::RegistryNumber(format!("Αριθμός Μητρώου (Στοάς): {}", PLACEHOLDER))
        ));
    }

    #[test]
    fn test_missing_values_use_placeholder_and_defaults() {
        let layout = build_card(
            &Member {
                member_id: 1,
                ..Member::default()
            },
            LODGE,
            date(2026, 1, 15),
        );

        assert_eq!(table_value(&layout, "Επώνυμο:"), Some(PLACEHOLDER));
        assert_eq!(table_value(&layout, "E-mail:"), Some(PLACEHOLDER));
        assert_eq!(table_value(&layout, "Τρέχων Βαθμός:"), Some("Μαθητής"));
        assert_eq!(table_value(&layout, "Στοά Μύησης:"), Some(LODGE));
        assert_eq!(table_value(&layout, "Κατάσταση Μέλους:"), Some("Ενεργό"));
        assert_eq!(table_value(&layout, "Οικον. Τακτοποίηση:"), Some("Ναι"));
    }

    #[test]
    fn test_legacy_columns_are_fallbacks() {
        let mut legacy = member();
        legacy.set(MemberField::Afm, Some("099999999".into()));
        legacy.set(MemberField::EmergencyContactName, Some("Ελένη".into()));
        let layout = build_card(&legacy, LODGE, date(2026, 1, 15));
        assert_eq!(table_value(&layout, "ΑΦΜ:"), Some("099999999"));
        assert_eq!(table_value(&layout, "Επαφή Έκτ. Ανάγκης:"), Some("Ελένη"));

        legacy.set(MemberField::TaxId, Some("123456789".into()));
        legacy.set(MemberField::EmergencyContact, Some("Μαρία".into()));
        let layout = build_card(&legacy, LODGE, date(2026, 1, 15));
        assert_eq!(table_value(&layout, "ΑΦΜ:"), Some("123456789"));
        assert_eq!(table_value(&layout, "Επαφή Έκτ. Ανάγκης:"), Some("Μαρία"));
    }

    #[test]
    fn test_notes_block_only_when_present() {
        let heading = Block::Heading("ΠΑΡΑΤΗΡΗΣΕΙΣ".into());

        let layout = build_card(&member(), LODGE, date(2026, 1, 15));
        assert!(!has_block(&layout, &heading));

        let mut noted = member();
        noted.set(MemberField::Notes, Some("   ".into()));
        assert!(!has_block(&build_card(&noted, LODGE, date(2026, 1, 15)), &heading));

        noted.set(MemberField::Notes, Some("Μετακόμισε στη Θεσσαλονίκη".into()));
        let layout = build_card(&noted, LODGE, date(2026, 1, 15));
        assert!(has_block(&layout, &heading));
        assert!(has_block(
            &layout,
            &Block::Paragraph("Μετακόμισε στη Θεσσαλονίκη".into())
        ));
    }

    #[test]
    fn test_sections_keep_fixed_order() {
        let layout = build_card(&member(), LODGE, date(2026, 1, 15));
        let headings: Vec<_> = layout
            .blocks
            .iter()
            .filter_map(|block| match block {
                Block::Heading(h) => Some(h.as_str()),
                Block::PageBreak => Some("<page>"),
                _ => None,
            })
            .collect();

        assert_eq!(
            headings,
            vec![
                "ΠΡΟΣΩΠΙΚΑ ΣΤΟΙΧΕΙΑ",
                "ΣΤΟΙΧΕΙΑ ΕΠΙΚΟΙΝΩΝΙΑΣ",
                "ΣΤΟΙΧΕΙΑ ΜΕΓΑΛΗΣ ΣΤΟΑΣ",
                "<page>",
                "ΙΣΤΟΡΙΚΟ ΣΤΟΑΣ",
                "ΟΙΚΟΓΕΝΕΙΑΚΑ ΣΤΟΙΧΕΙΑ",
                "ΔΙΟΙΚΗΤΙΚΑ ΣΤΟΙΧΕΙΑ",
            ]
        );
    }

    #[test]
    fn test_layout_is_deterministic_and_only_issue_date_varies() {
        let first = build_card(&member(), LODGE, date(2026, 1, 15));
        let second = build_card(&member(), LODGE, date(2026, 1, 15));
        assert_eq!(first, second);

        let later = build_card(&member(), LODGE, date(2026, 2, 1));
        assert_eq!(first.blocks.len(), later.blocks.len());

        let differing: Vec<_> = first
            .blocks
            .iter()
            .zip(&later.blocks)
            .filter(|(a, b)| a != b)
            .collect();
        assert_eq!(differing.len(), 1);
        assert_eq!(table_value(&first, ISSUE_DATE_LABEL), Some("15/01/2026"));
        assert_eq!(table_value(&later, ISSUE_DATE_LABEL), Some("01/02/2026"));
    }
}
