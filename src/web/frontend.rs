//! Embedded HTML/CSS/JS frontend for the fishsort dashboard.
//!
//! The whole page is compiled into the binary as a string constant.
//! No external assets, no build tools, no CDN dependencies.

/// The complete single-page dashboard HTML.
pub const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>fishsort History</title>
<style>
:root {
  --bg: #0d1117;
  --surface: #161b22;
  --border: #30363d;
  --text: #e6edf3;
  --text-muted: #8b949e;
  --accent: #58a6ff;
  --green: #3fb950;
  --red: #f85149;
  --radius: 8px;
  --font: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif;
  --mono: 'SF Mono', 'Cascadia Code', 'Fira Code', monospace;
}

* { margin: 0; padding: 0; box-sizing: border-box; }
body {
  background: var(--bg);
  color: var(--text);
  font-family: var(--font);
  font-size: 14px;
  line-height: 1.5;
}

.app { max-width: 1200px; margin: 0 auto; padding: 24px; }

header {
  display: flex;
  align-items: baseline;
  gap: 12px;
  margin-bottom: 24px;
  padding-bottom: 16px;
  border-bottom: 1px solid var(--border);
}
header h1 { font-size: 24px; font-weight: 600; }
header h1 .logo { color: var(--accent); font-family: var(--mono); }
header .subtitle { color: var(--text-muted); font-size: 13px; }

.card {
  background: var(--surface);
  border: 1px solid var(--border);
  border-radius: var(--radius);
  padding: 20px;
  margin-bottom: 16px;
}
.card h2 { font-size: 16px; font-weight: 600; margin-bottom: 16px; }

form.query { display: flex; flex-wrap: wrap; gap: 12px; align-items: flex-end; }
form.query label { display: flex; flex-direction: column; gap: 4px; color: var(--text-muted); font-size: 12px; }
input, select, button {
  background: var(--bg);
  color: var(--text);
  border: 1px solid var(--border);
  border-radius: 6px;
  padding: 6px 10px;
  font-size: 13px;
}
button { cursor: pointer; }
button.primary { background: var(--accent); border-color: var(--accent); color: #fff; }
button:disabled { opacity: 0.5; cursor: default; }

.stats { display: grid; grid-template-columns: repeat(3, 1fr); gap: 16px; }
.stat .value { font-size: 28px; font-weight: 600; font-family: var(--mono); }
.stat .label { color: var(--text-muted); font-size: 12px; }

.grid { display: grid; grid-template-columns: 2fr 1fr; gap: 16px; }
canvas { width: 100%; height: 260px; }

table { width: 100%; border-collapse: collapse; font-size: 13px; }
th, td { text-align: left; padding: 6px 8px; border-bottom: 1px solid var(--border); }
th { color: var(--text-muted); font-weight: 500; }
td.num { text-align: right; font-family: var(--mono); }
.muted { color: var(--text-muted); }
.error { color: var(--red); }
</style>
</head>
<body>
<div class="app">
  <header>
    <h1><span class="logo">fishsort</span> history</h1>
    <span class="subtitle" id="subtitle"></span>
  </header>

  <div class="card">
    <form class="query" id="query">
      <label>Start <input type="datetime-local" id="start"></label>
      <label>End <input type="datetime-local" id="end"></label>
      <label>Fish type
        <select id="fish"><option value="">All types</option></select>
      </label>
      <button type="submit" class="primary" id="run">Query</button>
      <button type="button" id="export" disabled>Export CSV</button>
      <span id="message" class="muted"></span>
    </form>
  </div>

  <div class="card stats">
    <div class="stat"><div class="value" id="count">-</div><div class="label">Records</div></div>
    <div class="stat"><div class="value" id="total">-</div><div class="label">Total weight</div></div>
    <div class="stat"><div class="value" id="avg">-</div><div class="label">Average weight</div></div>
  </div>

  <div class="grid">
    <div class="card">
      <h2>Weight distribution</h2>
      <canvas id="histogram" width="760" height="260"></canvas>
    </div>
    <div class="card">
      <h2>Average by fish type</h2>
      <table><tbody id="averages"></tbody></table>
    </div>
  </div>

  <div class="card">
    <h2>Records <span class="muted" id="truncated"></span></h2>
    <table>
      <thead><tr><th>Time</th><th>Code</th><th>Name</th><th>Weight</th><th>Fish avg</th></tr></thead>
      <tbody id="rows"></tbody>
    </table>
  </div>
</div>

<script>
const $ = (id) => document.getElementById(id);
let unit = 'g';

function pad(n) { return String(n).padStart(2, '0'); }
function inputValue(d) {
  return `${d.getFullYear()}-${pad(d.getMonth() + 1)}-${pad(d.getDate())}T${pad(d.getHours())}:${pad(d.getMinutes())}`;
}
function fmt(w) {
  return unit === 'kg'
    ? `${w.toFixed(2)} kg`
    : `${Math.round(w).toLocaleString()} g`;
}
function esc(s) {
  return String(s ?? '').replace(/[&<>"]/g, (c) => ({ '&': '&amp;', '<': '&lt;', '>': '&gt;', '"': '&quot;' }[c]));
}

async function getJson(url) {
  const resp = await fetch(url);
  const body = await resp.json();
  if (!resp.ok) throw new Error(body.error || resp.statusText);
  return body;
}

async function loadFishTypes() {
  try {
    const types = await getJson('/api/fish-types');
    for (const t of types) {
      const opt = document.createElement('option');
      opt.value = t.code;
      opt.textContent = `${t.code} ${t.name}`;
      $('fish').appendChild(opt);
    }
  } catch (e) {
    $('message').textContent = `fish types unavailable: ${e.message}`;
  }
}

function drawHistogram(hist, meanRatio) {
  const canvas = $('histogram');
  const ctx = canvas.getContext('2d');
  ctx.clearRect(0, 0, canvas.width, canvas.height);
  if (!hist) return;

  const left = 40, bottom = canvas.height - 40, top = 10;
  const width = canvas.width - left - 10;
  const peak = Math.max(1, ...hist.bins.map((b) => b.count));
  const barW = width / hist.bins.length;

  ctx.font = '10px sans-serif';
  hist.bins.forEach((bin, i) => {
    const h = (bin.count / peak) * (bottom - top);
    ctx.fillStyle = 'rgba(88, 166, 255, 0.6)';
    ctx.fillRect(left + i * barW + 1, bottom - h, barW - 2, h);
    ctx.save();
    ctx.translate(left + i * barW + barW / 2, bottom + 6);
    ctx.rotate(Math.PI / 5);
    ctx.fillStyle = '#8b949e';
    ctx.fillText(bin.range_label, 0, 0);
    ctx.restore();
  });

  if (meanRatio !== null && meanRatio !== undefined) {
    const x = left + meanRatio * width;
    ctx.strokeStyle = '#f85149';
    ctx.setLineDash([5, 5]);
    ctx.lineWidth = 2;
    ctx.beginPath();
    ctx.moveTo(x, top);
    ctx.lineTo(x, bottom);
    ctx.stroke();
    ctx.setLineDash([]);
    ctx.fillStyle = '#f85149';
    ctx.fillText('avg', x + 4, top + 10);
  }
}

function render(data) {
  unit = data.weight_unit;
  const view = data.view;
  $('subtitle').textContent = `${view.records.length} records, revision ${data.revision}`;
  $('count').textContent = view.stats.count.toLocaleString();
  $('total').textContent = fmt(view.stats.total_weight);
  $('avg').textContent = fmt(view.stats.avg_weight);
  $('export').disabled = view.records.length === 0;

  $('averages').innerHTML = data.fish_averages
    .map((f) => `<tr><td>${esc(f.code || '--')}</td><td>${esc(f.name || '--')}</td><td class="num">${fmt(f.avg_weight)}</td></tr>`)
    .join('');

  drawHistogram(view.histogram, data.mean_ratio);

  const table = data.table;
  $('rows').innerHTML = table
    ? table.rows
        .map((r) => `<tr><td>${esc(r.time)}</td><td>${esc(r.code)}</td><td>${esc(r.name)}</td><td class="num">${r.weight}</td><td class="num">${esc(r.fish_avg)}</td></tr>`)
        .join('')
    : '';
  $('truncated').textContent = table && table.total > table.rows.length
    ? `(showing ${table.rows.length} of ${table.total})`
    : '';
}

async function runQuery(ev) {
  if (ev) ev.preventDefault();
  const params = new URLSearchParams({
    start: $('start').value,
    end: $('end').value,
    fish_code: $('fish').value,
  });
  $('run').disabled = true;
  $('message').className = 'muted';
  $('message').textContent = 'Loading...';
  try {
    render(await getJson(`/api/analytics?${params}`));
    $('message').textContent = '';
  } catch (e) {
    $('message').className = 'error';
    $('message').textContent = e.message;
  } finally {
    $('run').disabled = false;
  }
}

$('export').addEventListener('click', async () => {
  const resp = await fetch('/api/export.csv');
  if (!resp.ok) {
    $('message').textContent = 'No data to export';
    return;
  }
  const blob = await resp.blob();
  const disposition = resp.headers.get('Content-Disposition') || '';
  const match = disposition.match(/filename="([^"]+)"/);
  const a = document.createElement('a');
  a.href = URL.createObjectURL(blob);
  a.download = match ? match[1] : 'production_history.csv';
  a.click();
  setTimeout(() => URL.revokeObjectURL(a.href), 1000);
});

$('query').addEventListener('submit', runQuery);

const now = new Date();
$('end').value = inputValue(now);
$('start').value = inputValue(new Date(now.getTime() - 24 * 3600 * 1000));
loadFishTypes().then(() => runQuery());
</script>
</body>
</html>
"##;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_link_is_revoked_after_the_download_starts() {
        let click = INDEX_HTML.find("a.click();").unwrap();
        let revoke = INDEX_HTML
            .find("setTimeout(() => URL.revokeObjectURL(a.href)")
            .unwrap();
        assert!(click < revoke);
        assert_eq!(INDEX_HTML.matches("revokeObjectURL").count(), 1);
    }
}
