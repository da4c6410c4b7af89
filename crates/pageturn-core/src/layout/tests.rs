use super::*;

fn dual(isolate_cover: bool) -> PlanOptions {
    PlanOptions {
        dual_page: true,
        isolate_cover,
        direction: ReadingDirection::LeftToRight,
    }
}

fn covered_pages(plan: &LayoutPlan) -> Vec<u16> {
    plan.units().iter().flat_map(|unit| unit.pages()).collect()
}

#[test]
fn every_plan_ends_with_one_end_unit_and_covers_each_page_once() {
    for page_count in 0..24u16 {
        for dual_page in [false, true] {
            for isolate_cover in [false, true] {
                let options = PlanOptions {
                    dual_page,
                    isolate_cover,
                    direction: ReadingDirection::LeftToRight,
                };
                let plan = plan(page_count, &options);

                assert_eq!(plan.units().last(), Some(&RenderUnit::End));
                assert_eq!(
                    plan.units().iter().filter(|unit| unit.is_end()).count(),
                    1
                );
                let pages = covered_pages(&plan);
                let expected: Vec<u16> = (0..page_count).collect();
                assert_eq!(pages, expected, "page_count={page_count} dual={dual_page}");
            }
        }
    }
}

#[test]
fn isolated_cover_with_seven_pages() {
    let plan = plan(7, &dual(true));
    assert_eq!(
        plan.units(),
        &[
            RenderUnit::Single(0),
            RenderUnit::Pair(1, 2),
            RenderUnit::Pair(3, 4),
            RenderUnit::Pair(5, 6),
            RenderUnit::End,
        ]
    );

    let mut index = 0;
    let mut steps = 0;
    while let Some(next) = plan.next_unit(index) {
        index = next;
        steps += 1;
    }
    assert_eq!(steps, 4);
    assert_eq!(plan.unit(index), Some(RenderUnit::End));
}

#[test]
fn trailing_odd_page_renders_alone() {
    let plan = plan(5, &dual(false));
    assert_eq!(
        plan.units(),
        &[
            RenderUnit::Pair(0, 1),
            RenderUnit::Pair(2, 3),
            RenderUnit::Single(4),
            RenderUnit::End,
        ]
    );
}

#[test]
fn degenerate_page_counts() {
    assert_eq!(plan(0, &dual(true)).units(), &[RenderUnit::End]);
    assert_eq!(
        plan(1, &dual(false)).units(),
        &[RenderUnit::Single(0), RenderUnit::End]
    );
}

#[test]
fn wide_pages_break_pairing() {
    let plan = plan_with(6, &dual(true), |page| page == 2);
    assert_eq!(
        plan.units(),
        &[
            RenderUnit::Single(0),
            RenderUnit::Single(1),
            RenderUnit::Single(2),
            RenderUnit::Pair(3, 4),
            RenderUnit::Single(5),
            RenderUnit::End,
        ]
    );
}

#[test]
fn rtl_swaps_visual_sides_only() {
    let options = PlanOptions {
        direction: ReadingDirection::RightToLeft,
        ..dual(true)
    };
    let plan = plan(3, &options);
    assert_eq!(plan.unit(1), Some(RenderUnit::Pair(1, 2)));
    assert_eq!(
        RenderUnit::Pair(1, 2).visual_sides(ReadingDirection::RightToLeft),
        (Some(2), Some(1))
    );
    assert_eq!(
        RenderUnit::Pair(1, 2).visual_sides(ReadingDirection::LeftToRight),
        (Some(1), Some(2))
    );
}

#[test]
fn page_lookup_maps_into_pairs_and_end() {
    let plan = plan(7, &dual(true));
    assert_eq!(plan.unit_index_for_page(0), 0);
    assert_eq!(plan.unit_index_for_page(2), 1);
    assert_eq!(plan.unit_index_for_page(5), 3);
    assert_eq!(plan.unit_index_for_page(6), 3);
    assert_eq!(plan.unit_index_for_page(7), plan.end_index());
    assert_eq!(plan.anchor_page(plan.end_index()), Some(6));
    assert_eq!(plan.previous_unit(0), None);
}

#[test]
fn dual_layout_requires_landscape() {
    assert!(PageLayout::Dual.dual_active(ViewportSize::new(1600, 900)));
    assert!(!PageLayout::Dual.dual_active(ViewportSize::new(900, 1600)));
    assert!(!PageLayout::Single.dual_active(ViewportSize::new(1600, 900)));
}

#[test]
fn direction_labels_parse() {
    assert_eq!(
        ReadingDirection::from_label("RIGHT_TO_LEFT"),
        Some(ReadingDirection::RightToLeft)
    );
    assert_eq!(ReadingDirection::from_label("webtoon"), Some(ReadingDirection::Webtoon));
    assert_eq!(ReadingDirection::from_label("sideways"), None);
}
