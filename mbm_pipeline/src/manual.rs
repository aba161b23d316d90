/*!

This is the long-form manual for `mbm_pipeline` and `mbmdata`.

## Input format

The source is a spreadsheet with one row per country or territory and one
column per mechanism type. Column names are matched after trimming; column
order is not significant and extra columns are ignored.

```text
No,Country,Region,1. Carbon Tax,2. ETS,3. Tax Incentives,4. Fuel Mandates,5. VCM project,6. Feebates,7. CBAM,8. AMC,Total Mechanism
1,Indonesia,Asia,Carbon tax on coal,,,B30 mandate,12,,,,3
2,Chile,Americas,Fuel levy,,,,,,,,1
```

Cells are free text. An empty cell, or a cell reading `nan` in any casing,
means the mechanism is not recorded. In the presence columns an explicit `0`
also means "not recorded". The `5. VCM project` column is the only one with a
secondary numeric interpretation: its text is parsed as the number of
voluntary carbon market projects, and text that does not parse contributes no
count (it is not an error, and it is not zero).

Both Excel (`.xlsx`, via the `--excel-worksheet-name` option when the
workbook has several sheets) and CSV inputs are supported by the `mbmdata`
binary.

## Pipeline stages

1. load: the file is read once per process and cached by path.
2. [`reshape`](crate::reshape): wide table to cleaned wide table plus the
   long record set.
3. [`apply_filter`](crate::apply_filter): region / mechanism / country /
   keyword restriction, chosen by the user.
4. [`summarize`](crate::summarize): one [`CountrySummary`](crate::CountrySummary)
   per base country, carrying the mechanism-type count that colors the map,
   the deduplicated detail text and the VCM project sum.

## Presentation projections

Two distinct views are derived from the same summary and are exposed
separately:

* [`numbered_types`](crate::CountrySummary::numbered_types): `1. AMC`,
  `2. Carbon Tax`, and so on. Types only, compact, used for map hover text.
* [`detail_lines`](crate::CountrySummary::detail_lines): `Carbon Tax:
  levy A; levy B`. One line per type with the joined detail text, used by
  the country profile view.

## Territory codes

Map rendering needs ISO 3166-1 alpha-3 codes. [`to_iso3`](crate::to_iso3)
first consults a curated override table (apostrophe variants, colloquial
short names, observer entities), then the ISO registry. Names that resolve to
nothing are reported as an advisory and excluded from the map only; they stay
in every tabular view and in the export.

 */
