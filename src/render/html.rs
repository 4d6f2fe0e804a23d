use crate::render::ReportData;

/// Render a self-contained HTML report (data embedded as JSON, figures drawn
/// as inline SVG by the page script).
///
/// Important: we avoid `format!()` because the HTML contains many `{}` from JS
/// template literals (e.g., `${x}`), which would conflict with Rust formatting.
pub fn render_html_report(data: &ReportData) -> anyhow::Result<String> {
    // "</" inside a JSON string would end the <script> element early.
    let json = serde_json::to_string(data)?.replace("</", "<\\/");

    const TEMPLATE: &str = r##"<!doctype html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>ns-3 latency report</title>
<style>
  body { font-family: system-ui, -apple-system, Segoe UI, Roboto, Arial, sans-serif; margin: 0; }
  header { padding: 12px 16px; border-bottom: 1px solid #ddd; }
  main { padding: 12px 16px; }
  .muted { color: #777; font-size: 12px; }

  table { border-collapse: collapse; margin-top: 8px; }
  th, td { border-bottom: 1px solid #eee; padding: 6px 8px; text-align: left; font-size: 14px; }
  th { background: white; border-bottom: 1px solid #ddd; }
  .num { text-align: right; font-variant-numeric: tabular-nums; }

  .figure { margin: 24px 0; }
  .figure h3 { margin: 0 0 4px 0; font-size: 16px; }
  .legend { display: flex; gap: 12px; flex-wrap: wrap; font-size: 12px; color: #333; }
  .swatch { display: inline-block; width: 10px; height: 10px; margin-right: 4px; border-radius: 2px; }
  svg text { font-size: 11px; fill: #333; }
  pre { background: #fafafa; border: 1px solid #eee; padding: 8px; overflow: auto; font-size: 12px; }
</style>
</head>
<body>
<header>
  <h2 style="margin:0" id="title"></h2>
  <div class="muted">latency per experiment size</div>
</header>
<main>
  <table id="sizes">
    <thead>
      <tr>
        <th class="num">size</th>
        <th>results</th>
        <th class="num">runs</th>
        <th class="num">usable</th>
        <th class="num">data points</th>
        <th class="num">final mean (s)</th>
        <th class="num">+err</th>
        <th class="num">-err</th>
      </tr>
    </thead>
    <tbody id="sizesBody"></tbody>
  </table>

  <div id="figures"></div>
  <div id="exports"></div>
</main>

<script>
// Embedded report data (JSON object literal)
const DATA = __DATA__;

const COLORS = ["#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd",
                "#8c564b", "#e377c2", "#7f7f7f", "#bcbd22", "#17becf"];
const W = 720, H = 400, PAD = { l: 64, r: 16, t: 16, b: 48 };
const SVGNS = "http://www.w3.org/2000/svg";

function fmt(x) {
  if (x === null || x === undefined) return "-";
  return (Math.round(x * 1e6) / 1e6).toString();
}

function escapeHtml(s) {
  return String(s)
    .replaceAll("&", "&amp;")
    .replaceAll("<", "&lt;")
    .replaceAll(">", "&gt;")
    .replaceAll('"', "&quot;")
    .replaceAll("'", "&#39;");
}

function el(name, attrs, text) {
  const e = document.createElementNS(SVGNS, name);
  for (const [k, v] of Object.entries(attrs)) e.setAttribute(k, v);
  if (text !== undefined) e.textContent = text;
  return e;
}

function renderSizes() {
  const body = document.getElementById("sizesBody");
  for (const s of DATA.sizes) {
    const tr = document.createElement("tr");
    tr.innerHTML = `
      <td class="num">${s.size}</td>
      <td>${escapeHtml(s.source)}</td>
      <td class="num">${s.runs}</td>
      <td class="num">${s.usable_runs}</td>
      <td class="num">${s.data_points}</td>
      <td class="num">${fmt(s.final_mean)}</td>
      <td class="num">${fmt(s.upper)}</td>
      <td class="num">${fmt(s.lower)}</td>
    `;
    body.appendChild(tr);
  }
}

function bounds(fig) {
  let xmin = Infinity, xmax = -Infinity, ymin = 0, ymax = -Infinity;
  for (const s of fig.series) {
    for (const [x, y] of s.points) {
      xmin = Math.min(xmin, x); xmax = Math.max(xmax, x);
      ymin = Math.min(ymin, y); ymax = Math.max(ymax, y);
    }
  }
  for (const b of fig.error_bars) {
    ymax = Math.max(ymax, b.y + b.upper);
    ymin = Math.min(ymin, b.y - b.lower);
  }
  if (!isFinite(xmin)) { xmin = 0; xmax = 1; }
  if (!isFinite(ymax)) { ymax = 1; }
  if (xmin === xmax) { xmin -= 1; xmax += 1; }
  if (ymin === ymax) { ymax = ymin + 1; }
  const xpad = (xmax - xmin) * 0.05;
  return { xmin: xmin - xpad, xmax: xmax + xpad, ymin, ymax: ymax * 1.05 };
}

function drawFigure(fig) {
  const b = bounds(fig);
  const sx = x => PAD.l + (x - b.xmin) / (b.xmax - b.xmin) * (W - PAD.l - PAD.r);
  const sy = y => H - PAD.b - (y - b.ymin) / (b.ymax - b.ymin) * (H - PAD.t - PAD.b);

  const svg = el("svg", { width: W, height: H, viewBox: `0 0 ${W} ${H}` });
  svg.appendChild(el("line", { x1: PAD.l, y1: H - PAD.b, x2: W - PAD.r, y2: H - PAD.b, stroke: "#333" }));
  svg.appendChild(el("line", { x1: PAD.l, y1: PAD.t, x2: PAD.l, y2: H - PAD.b, stroke: "#333" }));

  for (let i = 0; i <= 5; i++) {
    const y = b.ymin + (b.ymax - b.ymin) * i / 5;
    svg.appendChild(el("line", { x1: PAD.l, y1: sy(y), x2: W - PAD.r, y2: sy(y), stroke: "#eee" }));
    svg.appendChild(el("text", { x: PAD.l - 6, y: sy(y) + 4, "text-anchor": "end" }, fmt(y)));
    const x = b.xmin + (b.xmax - b.xmin) * i / 5;
    svg.appendChild(el("text", { x: sx(x), y: H - PAD.b + 16, "text-anchor": "middle" }, fmt(x)));
  }
  svg.appendChild(el("text", { x: (W + PAD.l) / 2, y: H - 8, "text-anchor": "middle" }, fig.x_label));
  svg.appendChild(el("text", { x: 14, y: H / 2, "text-anchor": "middle",
    transform: `rotate(-90 14 ${H / 2})` }, fig.y_label));

  fig.series.forEach((s, i) => {
    const color = COLORS[i % COLORS.length];
    if (s.kind === "line" && s.points.length > 1) {
      const d = s.points.map(([x, y], j) => `${j ? "L" : "M"}${sx(x)},${sy(y)}`).join(" ");
      svg.appendChild(el("path", { d, fill: "none", stroke: color, "stroke-width": 1.5 }));
    }
    for (const [x, y] of s.points) {
      const r = s.kind === "scatter" ? 3 : 2.5;
      const c = el("circle", { cx: sx(x), cy: sy(y), r, fill: s.kind === "scatter" ? "none" : color, stroke: color });
      c.appendChild(el("title", {}, `${s.label}: (${fmt(x)}, ${fmt(y)})`));
      svg.appendChild(c);
    }
  });

  for (const e of fig.error_bars) {
    const x = sx(e.x), top = sy(e.y + e.upper), bot = sy(e.y - e.lower);
    svg.appendChild(el("line", { x1: x, y1: top, x2: x, y2: bot, stroke: "#000" }));
    svg.appendChild(el("line", { x1: x - 4, y1: top, x2: x + 4, y2: top, stroke: "#000" }));
    svg.appendChild(el("line", { x1: x - 4, y1: bot, x2: x + 4, y2: bot, stroke: "#000" }));
  }

  const wrap = document.createElement("div");
  wrap.className = "figure";
  const h = document.createElement("h3");
  h.textContent = `Figure ${fig.number}: ${fig.title}`;
  wrap.appendChild(h);

  const legend = document.createElement("div");
  legend.className = "legend";
  fig.series.forEach((s, i) => {
    const item = document.createElement("span");
    item.innerHTML = `<span class="swatch" style="background:${COLORS[i % COLORS.length]}"></span>${escapeHtml(s.label)}`;
    legend.appendChild(item);
  });
  wrap.appendChild(legend);
  wrap.appendChild(svg);
  document.getElementById("figures").appendChild(wrap);
}

function renderExports() {
  const root = document.getElementById("exports");
  for (const x of DATA.exports) {
    const h = document.createElement("h3");
    h.textContent = `coordinates: ${x.heading}`;
    const pre = document.createElement("pre");
    pre.textContent = x.text;
    root.appendChild(h);
    root.appendChild(pre);
  }
}

document.getElementById("title").textContent = DATA.title;
renderSizes();
for (const fig of DATA.figures) drawFigure(fig);
renderExports();
</script>
</body>
</html>
"##;

    Ok(TEMPLATE.replace("__DATA__", &json))
}
