//! Fusion of aggregates into groupings.

use std::collections::HashSet;

use common_error::{internal_err, SiftResult};
use sift_expr::{AggFunc, ExprId, ExprKind, ExprOp, ExprTree, VarId};

use super::rule::RewriteRule;
use crate::context::RewriteContext;

/// Turn a grouping whose groups are only ever aggregated into a grouping that
/// aggregates item by item.
///
/// ```text
/// e -> group each $i by $k = key as $g into { k: $k, n: count($g), s: sum($g -> transform each $x $x.p) }
/// ```
///
/// becomes a [`ExprOp::GroupAggregate`] with accumulators
/// `$agg0 = count($i)` and `$agg1 = sum($i.p)`, and the collect expression
/// reads `$agg0` and `$agg1` instead of materializing `$g`.
///
/// The rule only fires when every reference to `$g` in the collect
/// expression is the direct argument of an aggregate, possibly through
/// wrappers, or the input of a transform that is itself the argument of an
/// aggregate and whose projection only depends on the item.
pub struct InjectAggregate;

/// How one aggregate call consumes the group.
enum Feed {
    /// `f($g)`: the item itself.
    Item,
    /// `f($g -> transform each $x body)`: `body` with `$x` as the item.
    Projection { var: VarId, body: ExprId },
}

struct Site {
    call: ExprId,
    func: AggFunc,
    feed: Feed,
}

impl RewriteRule for InjectAggregate {
    fn name(&self) -> &'static str {
        "InjectAggregate"
    }

    fn description(&self) -> &'static str {
        "Compute per-group aggregates incrementally instead of materializing groups"
    }

    fn fire_on(&self) -> &'static [ExprKind] {
        &[ExprKind::GroupBy]
    }

    fn rewrite(&self, ctx: &mut RewriteContext<'_>, node: ExprId) -> SiftResult<bool> {
        let ExprOp::GroupBy { into } = *ctx.tree.op(node) else {
            return Ok(false);
        };
        let (Some(item), Some(collect)) = (ctx.tree.iteration_var(node), ctx.tree.child(node, 2))
        else {
            return Ok(false);
        };
        let Some(sites) = classify(ctx.tree, collect, into) else {
            return Ok(false);
        };
        if sites.is_empty() {
            return Ok(false);
        }

        let mut accumulators = Vec::with_capacity(sites.len());
        for site in sites {
            let var = ctx.fresh_var("agg");
            let per_item = match site.feed {
                Feed::Item => ctx.tree.var_ref(item),
                Feed::Projection { var: x, body } => ctx.clone_fresh(body, &[(x, item)]),
            };
            let reference = ctx.tree.var_ref(var);
            ctx.tree.replace_in_parent(site.call, reference)?;
            accumulators.push(ctx.tree.accumulator(var, site.func, per_item)?);
        }

        let tree = &mut *ctx.tree;
        let children = tree.take_children(node);
        let &[Some(item_binding), Some(key_binding), Some(collect)] = children.as_slice() else {
            internal_err!("group {} lost its bindings during aggregate injection", node);
        };
        let mut slots = vec![item_binding, key_binding];
        slots.extend(accumulators);
        slots.push(collect);
        let fused = tree.add(ExprOp::GroupAggregate, slots)?;
        tree.replace_in_parent(node, fused)?;
        Ok(true)
    }
}

/// Map every use of `group` under `collect` to the aggregate consuming it.
///
/// Returns `None` as soon as one use escapes.
fn classify(tree: &ExprTree, collect: ExprId, group: VarId) -> Option<Vec<Site>> {
    let inner: HashSet<VarId> = tree.bound_vars(collect).into_iter().collect();
    tree.var_uses(collect, group)
        .into_iter()
        .map(|use_site| classify_use(tree, collect, group, &inner, use_site))
        .collect()
}

fn classify_use(
    tree: &ExprTree,
    collect: ExprId,
    group: VarId,
    inner: &HashSet<VarId>,
    use_site: ExprId,
) -> Option<Site> {
    let mut cur = use_site;
    while cur != collect {
        let parent = tree.parent(cur)?;
        if !tree.kind(parent).is_a(ExprKind::Wrapper) {
            break;
        }
        cur = parent;
    }
    if cur == collect {
        return None;
    }

    let parent = tree.parent(cur)?;
    if let ExprOp::Aggregate(func) = *tree.op(parent) {
        return Some(Site {
            call: parent,
            func,
            feed: Feed::Item,
        });
    }

    let ExprOp::Binding(var) = *tree.op(parent) else {
        return None;
    };
    let transform = tree.parent(parent)?;
    if tree.kind(transform) != ExprKind::Transform || tree.slot(parent) != 0 || transform == collect
    {
        return None;
    }
    let call = tree.parent(transform)?;
    let ExprOp::Aggregate(func) = *tree.op(call) else {
        return None;
    };
    let body = tree.child(transform, 1)?;
    let depends_on_group = tree
        .free_vars(body)
        .into_iter()
        .any(|free| free == group || (free != var && inner.contains(&free)));
    if depends_on_group {
        return None;
    }
    Some(Site {
        call,
        func,
        feed: Feed::Projection { var, body },
    })
}

#[cfg(test)]
mod tests {
    use sift_expr::ArithOp;

    use super::*;
    use crate::environment::DefaultEnvironment;

    struct Grouping {
        tree: ExprTree,
        root: ExprId,
        group: ExprId,
    }

    /// `read() -> group each $i by $k = $i.k as $g into <collect>`
    fn grouping(collect: impl FnOnce(&mut ExprTree, VarId, VarId) -> ExprId) -> Grouping {
        let mut tree = ExprTree::new();
        let i = tree.fresh_var("i");
        let k = tree.fresh_var("k");
        let g = tree.fresh_var("g");
        let input = tree.call("read", vec![]).unwrap();
        let item = tree.var_ref(i);
        let key = tree.field(item, "k").unwrap();
        let body = collect(&mut tree, k, g);
        let group = tree.group_by(i, input, k, key, g, body).unwrap();
        let root = tree.query(group).unwrap();
        Grouping { tree, root, group }
    }

    fn fire(g: &mut Grouping) -> bool {
        let mut env = DefaultEnvironment;
        let mut ctx = RewriteContext::new(&mut g.tree, &mut env);
        InjectAggregate.rewrite(&mut ctx, g.group).unwrap()
    }

    #[test]
    fn test_count_and_projected_sum() {
        let mut g = grouping(|tree, k, g| {
            let key = tree.var_ref(k);
            let group = tree.var_ref(g);
            let count = tree.aggregate(AggFunc::Count, group).unwrap();
            let x = tree.fresh_var("x");
            let group = tree.var_ref(g);
            let xr = tree.var_ref(x);
            let price = tree.field(xr, "p").unwrap();
            let prices = tree.transform(x, group, price).unwrap();
            let sum = tree.aggregate(AggFunc::Sum, prices).unwrap();
            tree.record(vec![
                ("k".to_string(), key),
                ("n".to_string(), count),
                ("s".to_string(), sum),
            ])
            .unwrap()
        });

        assert!(fire(&mut g));
        g.tree.validate(g.root).unwrap();
        assert_eq!(
            g.tree.decompile(g.root),
            "read() -> group each $i by $k = $i.k aggregate $agg0 = count($i), \
             $agg1 = sum($i.p) into { k: $k, n: $agg0, s: $agg1 }"
        );
    }

    #[test]
    fn test_aggregate_through_wrapper() {
        let mut g = grouping(|tree, _k, g| {
            let group = tree.var_ref(g);
            let wrapped = tree.as_array(group).unwrap();
            tree.aggregate(AggFunc::Max, wrapped).unwrap()
        });

        assert!(fire(&mut g));
        g.tree.validate(g.root).unwrap();
        let fused = g.tree.child(g.root, 0).unwrap();
        assert_eq!(g.tree.kind(fused), ExprKind::GroupAggregate);
    }

    #[test]
    fn test_raw_group_use_blocks_fusion() {
        let mut g = grouping(|tree, _k, g| {
            let group = tree.var_ref(g);
            let count = tree.aggregate(AggFunc::Count, group).unwrap();
            let raw = tree.var_ref(g);
            tree.array(vec![count, raw]).unwrap()
        });
        let before = g.tree.decompile(g.root);

        assert!(!fire(&mut g));
        assert_eq!(g.tree.decompile(g.root), before);
    }

    #[test]
    fn test_projection_reading_group_blocks_fusion() {
        let mut g = grouping(|tree, _k, g| {
            let x = tree.fresh_var("x");
            let group = tree.var_ref(g);
            let inner_group = tree.var_ref(g);
            let body = tree.aggregate(AggFunc::Count, inner_group).unwrap();
            let projected = tree.transform(x, group, body).unwrap();
            tree.aggregate(AggFunc::Sum, projected).unwrap()
        });

        assert!(!fire(&mut g));
    }

    #[test]
    fn test_projection_reading_collect_local_blocks_fusion() {
        let mut g = grouping(|tree, _k, g| {
            let c = tree.fresh_var("c");
            let two = tree.constant(2);
            let scale = tree.binding(c, two).unwrap();
            let x = tree.fresh_var("x");
            let group = tree.var_ref(g);
            let xr = tree.var_ref(x);
            let price = tree.field(xr, "p").unwrap();
            let cr = tree.var_ref(c);
            let scaled = tree.arith(ArithOp::Multiply, price, cr).unwrap();
            let projected = tree.transform(x, group, scaled).unwrap();
            let sum = tree.aggregate(AggFunc::Sum, projected).unwrap();
            tree.do_block(vec![scale], sum).unwrap()
        });
        let before = g.tree.decompile(g.root);

        assert!(!fire(&mut g));
        assert_eq!(g.tree.decompile(g.root), before);
        g.tree.validate(g.root).unwrap();
    }

    #[test]
    fn test_group_unused() {
        let mut g = grouping(|tree, k, _g| tree.var_ref(k));
        assert!(!fire(&mut g));
    }
}
